//! Toolchain abstraction for generating ninja build descriptions.
//!
//! A backend turns (architecture, build configuration, artifact kind) into
//! compiler, archiver and linker flags, and exports them as ninja variables,
//! rules and build statements:
//! - **Backends:** [`ClangToolchain`] (desktop, Raspberry Pi, Android) and
//!   [`XcodeToolchain`] (macOS, iOS)
//! - **Resolution:** Android NDK/SDK discovery and Apple SDK lookup through a
//!   [`ToolLocator`]
//! - **Emission:** a [`BuildWriter`] receives variables, rules and statements;
//!   [`dispatch::build`] maps each artifact kind to its emitter

pub mod android;
pub mod apple;
pub mod clang;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod host;
pub mod lifecycle;
pub mod locator;
pub mod prefs;
pub mod toolchain;
pub mod version;
pub mod writer;
pub mod xcode;

pub use clang::ClangToolchain;
pub use dispatch::{build, BuildRequest};
pub use error::{Result, ToolchainError};
pub use flags::{FlagComposer, FlagSet};
pub use host::HostInfo;
pub use locator::{ToolLocator, Xcrun};
pub use prefs::Preferences;
pub use toolchain::{
    create, write_rules, write_variables, BackendKind, LocalOptions, Toolchain, ToolchainContext,
};
pub use writer::{BuildWriter, NinjaWriter, Recorder};
pub use xcode::XcodeToolchain;
