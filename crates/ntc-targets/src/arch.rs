//! Target CPU/ABI architectures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// A CPU/ABI target that compiled artifacts run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86-64")]
    X86_64,
    /// ARMv6 (built as ARMv5TE on Android).
    #[serde(rename = "arm6")]
    Arm6,
    #[serde(rename = "arm7")]
    Arm7,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "mips")]
    Mips,
    #[serde(rename = "mips64")]
    Mips64,
}

impl Architecture {
    /// Every supported architecture, in tag order.
    pub const ALL: [Architecture; 7] = [
        Architecture::X86,
        Architecture::X86_64,
        Architecture::Arm6,
        Architecture::Arm7,
        Architecture::Arm64,
        Architecture::Mips,
        Architecture::Mips64,
    ];

    /// The canonical tag, also used as a path component for
    /// architecture-scoped outputs.
    pub fn tag(self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X86_64 => "x86-64",
            Architecture::Arm6 => "arm6",
            Architecture::Arm7 => "arm7",
            Architecture::Arm64 => "arm64",
            Architecture::Mips => "mips",
            Architecture::Mips64 => "mips64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Architecture {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        Architecture::ALL
            .into_iter()
            .find(|arch| arch.tag() == s)
            .ok_or_else(|| TargetError::UnknownArchitecture { tag: s.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_back() {
        for arch in Architecture::ALL {
            assert_eq!(arch.tag().parse::<Architecture>().unwrap(), arch);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "sparc".parse::<Architecture>().unwrap_err();
        assert_eq!(
            err,
            TargetError::UnknownArchitecture {
                tag: "sparc".into()
            }
        );
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&Architecture::X86_64).unwrap();
        assert_eq!(json, "\"x86-64\"");
        let arch: Architecture = serde_json::from_str("\"arm7\"").unwrap();
        assert_eq!(arch, Architecture::Arm7);
    }
}
