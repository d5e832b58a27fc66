//! Artifact kinds (the shape of a requested build output).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// The shape of a requested build output.
///
/// The `Multi*` variants are fan-outs of a base kind: one build per
/// requested architecture, each with an architecture-scoped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// A single compiled translation unit.
    Object,
    StaticLib,
    SharedLib,
    Executable,
    MultiStaticLib,
    MultiSharedLib,
    MultiExecutable,
}

impl ArtifactKind {
    /// Every artifact kind.
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::Object,
        ArtifactKind::StaticLib,
        ArtifactKind::SharedLib,
        ArtifactKind::Executable,
        ArtifactKind::MultiStaticLib,
        ArtifactKind::MultiSharedLib,
        ArtifactKind::MultiExecutable,
    ];

    /// The base kind a fan-out variant replicates. Base kinds map to themselves.
    pub fn base(self) -> ArtifactKind {
        match self {
            ArtifactKind::MultiStaticLib => ArtifactKind::StaticLib,
            ArtifactKind::MultiSharedLib => ArtifactKind::SharedLib,
            ArtifactKind::MultiExecutable => ArtifactKind::Executable,
            kind => kind,
        }
    }

    /// Whether this kind fans out over architectures.
    pub fn is_multi(self) -> bool {
        self.base() != self
    }

    /// Kebab-case tag.
    pub fn tag(self) -> &'static str {
        match self {
            ArtifactKind::Object => "object",
            ArtifactKind::StaticLib => "static-lib",
            ArtifactKind::SharedLib => "shared-lib",
            ArtifactKind::Executable => "executable",
            ArtifactKind::MultiStaticLib => "multi-static-lib",
            ArtifactKind::MultiSharedLib => "multi-shared-lib",
            ArtifactKind::MultiExecutable => "multi-executable",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ArtifactKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| TargetError::UnknownArtifactKind { tag: s.into() })
    }
}
