//! Build preferences.
//!
//! Preferences are a nested key/value document (`build.json` or a TOML
//! equivalent). Every key is optional: an absent key keeps the default the
//! backend computed, it is never an error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level preferences document. Unknown sections are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub clang: ClangPrefs,
    #[serde(default)]
    pub android: AndroidPrefs,
    #[serde(default)]
    pub macosx: ApplePrefs,
    #[serde(default)]
    pub ios: ApplePrefs,
}

/// `[clang]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClangPrefs {
    /// Directory prefix prepended to compiler, archiver and linker names.
    #[serde(default)]
    pub toolchain: Option<String>,
}

/// `[android]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidPrefs {
    /// NDK root; overrides `NDK_HOME`.
    #[serde(default)]
    pub ndkpath: Option<String>,
    /// SDK root; overrides `ANDROID_HOME`.
    #[serde(default)]
    pub sdkpath: Option<String>,
    /// Target API level, e.g. `"21"`.
    #[serde(default)]
    pub platformversion: Option<String>,
}

/// `[macosx]` and `[ios]` sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplePrefs {
    #[serde(default)]
    pub deploymenttarget: Option<String>,
    #[serde(default)]
    pub organisation: Option<String>,
    #[serde(default)]
    pub bundleidentifier: Option<String>,
    #[serde(default)]
    pub provisioning: Option<String>,
}

impl Preferences {
    /// Parse JSON preferences.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse TOML preferences.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a preferences file; `.json` files are JSON, anything else TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }
}

/// Overwrite `slot` only when the preference is present.
pub(crate) fn override_with(slot: &mut String, pref: Option<&String>) {
    if let Some(value) = pref {
        slot.clone_from(value);
    }
}
