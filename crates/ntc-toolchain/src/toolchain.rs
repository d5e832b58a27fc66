//! The toolchain capability contract shared by every backend.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ntc_targets::{Architecture, ArtifactKind, BuildConfig, Platform};

use crate::clang::ClangToolchain;
use crate::error::{Result, ToolchainError};
use crate::flags::{include_path_flags, library_flags, library_path_flags, FlagComposer, FlagSet};
use crate::host::HostInfo;
use crate::locator::ToolLocator;
use crate::prefs::Preferences;
use crate::writer::{BuildStatement, BuildWriter, Bindings, Rule};
use crate::xcode::XcodeToolchain;

/// Everything a backend is configured from, besides preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainContext {
    /// Project name; becomes the `-D<PROJECT>_COMPILE=1` define.
    pub project: String,
    pub host: HostInfo,
    pub target: Platform,
    pub archs: Vec<Architecture>,
    pub configs: Vec<BuildConfig>,
    /// Include paths applied to every compile.
    pub include_paths: Vec<String>,
    /// Library search paths applied to every link.
    pub lib_paths: Vec<String>,
    /// Root of per-configuration library outputs (`lib/<config>/<arch>`).
    pub lib_root: String,
    /// Whether all modules are linked into one binary.
    pub monolithic: bool,
}

impl ToolchainContext {
    /// A context with the target's default architectures and all configurations.
    pub fn new(project: impl Into<String>, host: HostInfo, target: Platform) -> Self {
        Self {
            project: project.into(),
            host,
            target,
            archs: default_archs(target),
            configs: BuildConfig::ALL.to_vec(),
            include_paths: Vec::new(),
            lib_paths: Vec::new(),
            lib_root: "lib".into(),
            monolithic: false,
        }
    }

    pub fn with_archs(mut self, archs: Vec<Architecture>) -> Self {
        self.archs = archs;
        self
    }

    pub fn with_configs(mut self, configs: Vec<BuildConfig>) -> Self {
        self.configs = configs;
        self
    }

    pub fn with_include_paths(mut self, paths: Vec<String>) -> Self {
        self.include_paths = paths;
        self
    }

    pub fn with_lib_paths(mut self, paths: Vec<String>) -> Self {
        self.lib_paths = paths;
        self
    }

    pub fn monolithic(mut self, monolithic: bool) -> Self {
        self.monolithic = monolithic;
        self
    }

    /// `<lib_root>`, `<lib_root>/<config>`, `<lib_root>/<config>/<arch>`.
    pub fn config_lib_paths(&self, config: BuildConfig, arch: Architecture) -> Vec<String> {
        let root = Path::new(&self.lib_root);
        vec![
            root.display().to_string(),
            root.join(config.tag()).display().to_string(),
            root.join(config.tag()).join(arch.tag()).display().to_string(),
        ]
    }
}

/// Architectures built for a target when none are requested.
pub fn default_archs(target: Platform) -> Vec<Architecture> {
    match target {
        Platform::Android => Architecture::ALL.to_vec(),
        Platform::Ios => vec![Architecture::Arm7, Architecture::Arm64],
        Platform::RaspberryPi => vec![Architecture::Arm6],
        Platform::Windows | Platform::Linux | Platform::MacOsx | Platform::Bsd => {
            vec![Architecture::X86_64]
        }
    }
}

/// Per-request options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalOptions {
    /// Extra include paths for this statement.
    #[serde(default)]
    pub include_paths: Vec<String>,
    /// Libraries to link.
    #[serde(default)]
    pub libs: Vec<String>,
    /// Implicit dependencies of the statement.
    #[serde(default)]
    pub implicit_deps: Vec<String>,
}

/// A backend: base flags, command templates and per-statement bindings.
///
/// Implementations are immutable once constructed; every method takes
/// `&self` and recomputes per-request flags from scratch.
pub trait Toolchain: FlagComposer {
    /// Backend name (`clang`, `xcode`).
    fn name(&self) -> &'static str;

    fn context(&self) -> &ToolchainContext;

    fn target(&self) -> Platform {
        self.context().target
    }

    /// Global bindings exported once per build file.
    fn variables(&self) -> Result<Bindings>;

    /// Rules exported once per build file.
    fn rules(&self) -> &[Rule];

    fn object_extension(&self) -> &'static str {
        ".o"
    }

    /// Rule compiling `input`.
    fn compile_rule(&self, _input: &str) -> &'static str {
        "cc"
    }

    fn compile_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        options: &LocalOptions,
    ) -> Result<Bindings>;

    fn archive_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        options: &LocalOptions,
    ) -> Result<Bindings>;

    fn link_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        options: &LocalOptions,
        output: &str,
    ) -> Result<Bindings>;

    /// Combine architecture-scoped outputs of a fan-out into `merged`.
    ///
    /// Returns the merge statement, or `None` when the backend keeps the
    /// outputs separate.
    fn merge_statement(&self, _outputs: &[String], _merged: &str) -> Option<BuildStatement> {
        None
    }
}

/// Per-axis compile bindings common to clang-family backends.
pub fn common_compile_bindings<T: Toolchain + ?Sized>(
    toolchain: &T,
    config: BuildConfig,
    arch: Architecture,
    kind: ArtifactKind,
    options: &LocalOptions,
) -> Result<Bindings> {
    let mut vars = Bindings::new();
    vars.bind_flags("moreincludepaths", include_path_flags(&options.include_paths))?;
    vars.bind_flags("carchflags", toolchain.arch_compile_flags(arch, kind)?)?;
    vars.bind_flags("cconfigflags", toolchain.config_compile_flags(config, kind))?;
    vars.bind_flags("ckindflags", toolchain.kind_compile_flags(kind))?;
    Ok(vars)
}

/// Per-axis archive bindings common to clang-family backends.
pub fn common_archive_bindings<T: Toolchain + ?Sized>(
    toolchain: &T,
    config: BuildConfig,
    arch: Architecture,
    kind: ArtifactKind,
) -> Result<Bindings> {
    let mut vars = Bindings::new();
    vars.bind_flags("ararchflags", toolchain.arch_archive_flags(arch, kind)?)?;
    vars.bind_flags("arconfigflags", toolchain.config_archive_flags(config, kind))?;
    Ok(vars)
}

/// Per-axis link bindings common to clang-family backends.
///
/// `forward` adapts linker-only tokens (library paths) for the driver.
pub fn common_link_bindings<T: Toolchain + ?Sized>(
    toolchain: &T,
    config: BuildConfig,
    arch: Architecture,
    kind: ArtifactKind,
    options: &LocalOptions,
    forward: impl Fn(FlagSet) -> FlagSet,
) -> Result<Bindings> {
    let ctx = toolchain.context();
    let mut vars = Bindings::new();
    vars.bind_flags("linkarchflags", toolchain.arch_link_flags(arch, kind)?)?;
    vars.bind_flags("linkconfigflags", toolchain.config_link_flags(config, kind))?;
    vars.bind_flags("libs", library_flags(&options.libs))?;
    vars.bind(
        "configlibpaths",
        forward(library_path_flags(&ctx.config_lib_paths(config, arch), ctx.target)),
    )?;
    Ok(vars)
}

/// Export the toolchain's global bindings.
pub fn write_variables(toolchain: &dyn Toolchain, writer: &mut dyn BuildWriter) -> Result<()> {
    for binding in &toolchain.variables()? {
        writer.variable(&binding.name, &binding.value)?;
    }
    writer.newline()
}

/// Export the toolchain's rules.
pub fn write_rules(toolchain: &dyn Toolchain, writer: &mut dyn BuildWriter) -> Result<()> {
    for rule in toolchain.rules() {
        writer.rule(rule)?;
    }
    writer.newline()
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Clang,
    Xcode,
}

impl BackendKind {
    /// Xcode for Apple targets, clang everywhere else.
    pub fn default_for(target: Platform) -> Self {
        if target.is_apple() {
            BackendKind::Xcode
        } else {
            BackendKind::Clang
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Clang => "clang",
            BackendKind::Xcode => "xcode",
        })
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "clang" => Ok(BackendKind::Clang),
            "xcode" => Ok(BackendKind::Xcode),
            other => Err(format!("unknown toolchain backend '{other}'")),
        }
    }
}

/// Construct a ready backend.
pub fn create(
    backend: BackendKind,
    ctx: ToolchainContext,
    prefs: &Preferences,
    locator: &dyn ToolLocator,
) -> Result<Box<dyn Toolchain>> {
    tracing::debug!(%backend, target = %ctx.target, host = %ctx.host.platform, "creating toolchain");
    match backend {
        BackendKind::Clang => Ok(Box::new(ClangToolchain::new(ctx, prefs)?)),
        BackendKind::Xcode => Ok(Box::new(XcodeToolchain::new(ctx, prefs, locator)?)),
    }
}

/// Reject an architecture list with no entries.
pub(crate) fn require_archs(ctx: &ToolchainContext) -> Result<()> {
    if ctx.archs.is_empty() {
        return Err(ToolchainError::InvalidRequest {
            output: ctx.project.clone(),
            detail: "no architectures configured".into(),
        });
    }
    Ok(())
}
