//! Toolchain configuration errors.

use std::path::PathBuf;

use ntc_targets::{Architecture, Platform};

use crate::lifecycle::Stage;

/// Errors that abort a toolchain configuration pass.
///
/// None of these are retried; a failed pass leaves no usable toolchain.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// An architecture has no entry in a per-architecture lookup table.
    #[error("no entry for architecture '{arch}' in the {table} table")]
    MissingLookupEntry {
        /// Name of the lookup table.
        table: &'static str,
        /// The architecture that was looked up.
        arch: Architecture,
    },

    /// A preference needed to emit a build statement was never set.
    #[error("required preference '{key}' is not set ({hint})")]
    MissingPreference {
        /// Dotted preference key, e.g. `android.ndkpath`.
        key: &'static str,
        /// How the value can be supplied.
        hint: &'static str,
    },

    /// The backend cannot build for the requested target platform.
    #[error("{backend} toolchain does not support target platform '{platform}'")]
    UnsupportedPlatform {
        backend: &'static str,
        platform: Platform,
    },

    /// The host has no native toolchain label.
    #[error("no native toolchain is available for host platform '{platform}'")]
    UnsupportedHost { platform: Platform },

    /// An external discovery tool failed or returned nothing.
    #[error("discovery via {tool} failed: {detail}")]
    Discovery {
        /// The tool invocation, e.g. `xcrun --sdk macosx -f clang`.
        tool: String,
        /// What went wrong.
        detail: String,
    },

    /// The SDK build-tools directory contains no versioned entries.
    #[error("no build-tools versions found in {}", path.display())]
    NoBuildTools { path: PathBuf },

    /// A directory needed for discovery could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A variable name was bound twice in the same scope.
    #[error("variable '{name}' is already bound")]
    DuplicateVariable { name: String },

    /// A rule name was declared twice.
    #[error("rule '{name}' is already declared")]
    DuplicateRule { name: String },

    /// A value contains a line break, which ninja cannot represent.
    #[error("value of '{name}' spans more than one line")]
    MultilineValue { name: String },

    /// A lifecycle transition was skipped or repeated.
    #[error("invalid toolchain lifecycle transition from {from:?} to {to:?}")]
    Lifecycle { from: Stage, to: Stage },

    /// A build request cannot be emitted as given.
    #[error("invalid build request for '{output}': {detail}")]
    InvalidRequest { output: String, detail: String },

    /// I/O error during discovery or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON preferences or output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML preferences error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
