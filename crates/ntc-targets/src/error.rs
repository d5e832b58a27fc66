//! Error types for parsing build axes.

/// Errors that can occur while parsing an axis value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    /// Architecture tag not in the supported set.
    #[error("unknown architecture: '{tag}'")]
    UnknownArchitecture {
        /// The rejected tag.
        tag: String,
    },

    /// Build configuration tag not in the supported set.
    #[error("unknown build configuration: '{tag}'")]
    UnknownConfig {
        /// The rejected tag.
        tag: String,
    },

    /// Artifact kind tag not in the supported set.
    #[error("unknown artifact kind: '{tag}'")]
    UnknownArtifactKind {
        /// The rejected tag.
        tag: String,
    },

    /// Platform tag not in the supported set.
    #[error("unknown platform: '{tag}'")]
    UnknownPlatform {
        /// The rejected tag.
        tag: String,
    },
}

/// Result type for axis parsing.
pub type Result<T> = std::result::Result<T, TargetError>;
