//! Ordered flag sets and the per-axis flag composition contract.
//!
//! Flags are composed by concatenation in a fixed precedence order:
//! base → architecture → configuration → artifact kind. Later tokens may
//! override earlier ones, so a [`FlagSet`] never reorders or deduplicates.

use std::fmt;

use serde::{Deserialize, Serialize};

use ntc_targets::{Architecture, ArtifactKind, BuildConfig, Platform};

use crate::error::Result;

/// Macro defined for every translation unit that ends up in a shared library.
pub const DYNAMIC_LINK_DEFINE: &str = "-DBUILD_DYNAMIC_LINK=1";

/// An order-significant sequence of command-line tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(Vec<String>);

impl FlagSet {
    /// An empty flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one token.
    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    /// Concatenate `other` after `self`.
    pub fn then(mut self, other: FlagSet) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Whether a token equal to `token` is present.
    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for FlagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for FlagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl From<Vec<String>> for FlagSet {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl IntoIterator for FlagSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-axis flag composition for one backend and target platform.
///
/// Every method is pure: the same arguments always give the same tokens.
/// Architecture lookups fail with
/// [`ToolchainError::MissingLookupEntry`](crate::ToolchainError::MissingLookupEntry)
/// rather than returning an empty set.
pub trait FlagComposer {
    fn arch_compile_flags(&self, arch: Architecture, kind: ArtifactKind) -> Result<FlagSet>;

    fn config_compile_flags(&self, config: BuildConfig, kind: ArtifactKind) -> FlagSet;

    fn arch_archive_flags(&self, _arch: Architecture, _kind: ArtifactKind) -> Result<FlagSet> {
        Ok(FlagSet::new())
    }

    fn config_archive_flags(&self, _config: BuildConfig, _kind: ArtifactKind) -> FlagSet {
        FlagSet::new()
    }

    fn arch_link_flags(&self, arch: Architecture, kind: ArtifactKind) -> Result<FlagSet>;

    fn config_link_flags(&self, config: BuildConfig, kind: ArtifactKind) -> FlagSet;

    /// Artifact-kind-specific compile flags, appended last.
    fn kind_compile_flags(&self, kind: ArtifactKind) -> FlagSet {
        kind_compile_flags(kind)
    }

    /// Architecture, configuration and kind compile flags in precedence order.
    fn compile_flags(
        &self,
        arch: Architecture,
        config: BuildConfig,
        kind: ArtifactKind,
    ) -> Result<FlagSet> {
        Ok(self
            .arch_compile_flags(arch, kind)?
            .then(self.config_compile_flags(config, kind))
            .then(self.kind_compile_flags(kind)))
    }

    /// Architecture then configuration archive flags.
    fn archive_flags(
        &self,
        arch: Architecture,
        config: BuildConfig,
        kind: ArtifactKind,
    ) -> Result<FlagSet> {
        Ok(self
            .arch_archive_flags(arch, kind)?
            .then(self.config_archive_flags(config, kind)))
    }

    /// Architecture then configuration link flags.
    fn link_flags(
        &self,
        arch: Architecture,
        config: BuildConfig,
        kind: ArtifactKind,
    ) -> Result<FlagSet> {
        Ok(self
            .arch_link_flags(arch, kind)?
            .then(self.config_link_flags(config, kind)))
    }
}

/// Configuration compile flags shared by the clang-family backends.
pub fn config_compile_flags(config: BuildConfig) -> FlagSet {
    let mut flags = FlagSet::new();
    flags.push(format!("-D{}=1", config.define_name()));
    if config.is_optimized() {
        flags.push("-O3");
    }
    flags.push("-g");
    if config.is_optimized() {
        flags.push("-funroll-loops");
    }
    flags
}

/// The dynamic-link marker for shared libraries, nothing for other kinds.
pub fn kind_compile_flags(kind: ArtifactKind) -> FlagSet {
    let mut flags = FlagSet::new();
    if kind.base() == ArtifactKind::SharedLib {
        flags.push(DYNAMIC_LINK_DEFINE);
    }
    flags
}

/// Quote a path that contains whitespace so it survives shell splitting.
pub fn path_escape(path: &str) -> String {
    if path.chars().any(char::is_whitespace) {
        format!("\"{path}\"")
    } else {
        path.to_string()
    }
}

/// `-I` tokens for each include path, in order.
pub fn include_path_flags<S: AsRef<str>>(paths: &[S]) -> FlagSet {
    paths
        .iter()
        .map(|p| format!("-I{}", path_escape(p.as_ref())))
        .collect()
}

/// Library search path tokens, in order: `/LIBPATH:` for Windows targets,
/// `-L` everywhere else.
pub fn library_path_flags<S: AsRef<str>>(paths: &[S], target: Platform) -> FlagSet {
    let prefix = if target.is_windows() { "/LIBPATH:" } else { "-L" };
    paths
        .iter()
        .map(|p| format!("{prefix}{}", path_escape(p.as_ref())))
        .collect()
}

/// `-l` tokens for each library, in order.
pub fn library_flags<S: AsRef<str>>(libs: &[S]) -> FlagSet {
    libs.iter().map(|l| format!("-l{}", l.as_ref())).collect()
}

/// `-framework <name>` token pairs for Apple linkers.
pub fn framework_flags<S: AsRef<str>>(frameworks: &[S]) -> FlagSet {
    frameworks
        .iter()
        .flat_map(|f| ["-framework".to_string(), f.as_ref().to_string()])
        .collect()
}

/// Forward linker-only tokens through the compiler driver.
///
/// MSVC-style tokens (`/DLL`, `/LIBPATH:`) need a preceding `-Xlinker` when
/// the clang driver links for Windows; other targets pass them as-is.
pub fn linker_passthrough(flags: FlagSet, target: Platform) -> FlagSet {
    if !target.is_windows() {
        return flags;
    }
    flags
        .into_iter()
        .flat_map(|token| ["-Xlinker".to_string(), token])
        .collect()
}
