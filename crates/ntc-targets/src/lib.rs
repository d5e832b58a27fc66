//! Build axes for the ntc toolchain layer.
//!
//! Every build instruction is computed from an orthogonal combination of:
//! - **Architecture:** the CPU/ABI the artifact runs on
//! - **Build configuration:** debug, release, profile or deploy
//! - **Artifact kind:** object, static/shared library, executable, or a
//!   multi-architecture fan-out of one of those
//! - **Platform:** the operating system of the host or the target

pub mod arch;
pub mod artifact;
pub mod config;
pub mod error;
pub mod platform;

pub use arch::Architecture;
pub use artifact::ArtifactKind;
pub use config::BuildConfig;
pub use error::{Result, TargetError};
pub use platform::Platform;
