//! Build configurations (optimization/debug profiles).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// An optimization/debug profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildConfig {
    Debug,
    Release,
    Profile,
    Deploy,
}

impl BuildConfig {
    /// Every configuration, in tag order.
    pub const ALL: [BuildConfig; 4] = [
        BuildConfig::Debug,
        BuildConfig::Release,
        BuildConfig::Profile,
        BuildConfig::Deploy,
    ];

    /// Lowercase tag, also used as a library path component.
    pub fn tag(self) -> &'static str {
        match self {
            BuildConfig::Debug => "debug",
            BuildConfig::Release => "release",
            BuildConfig::Profile => "profile",
            BuildConfig::Deploy => "deploy",
        }
    }

    /// The configuration macro, e.g. `BUILD_RELEASE`.
    pub fn define_name(self) -> String {
        format!("BUILD_{}", self.tag().to_uppercase())
    }

    /// Whether the configuration is compiled with optimizations.
    pub fn is_optimized(self) -> bool {
        !matches!(self, BuildConfig::Debug)
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for BuildConfig {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        BuildConfig::ALL
            .into_iter()
            .find(|config| config.tag() == s)
            .ok_or_else(|| TargetError::UnknownConfig { tag: s.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_names() {
        assert_eq!(BuildConfig::Debug.define_name(), "BUILD_DEBUG");
        assert_eq!(BuildConfig::Deploy.define_name(), "BUILD_DEPLOY");
    }

    #[test]
    fn parse_round_trip() {
        for config in BuildConfig::ALL {
            assert_eq!(config.to_string().parse::<BuildConfig>().unwrap(), config);
        }
        assert!("fast".parse::<BuildConfig>().is_err());
    }

    #[test]
    fn only_debug_is_unoptimized() {
        assert!(!BuildConfig::Debug.is_optimized());
        assert!(BuildConfig::Release.is_optimized());
        assert!(BuildConfig::Profile.is_optimized());
    }
}
