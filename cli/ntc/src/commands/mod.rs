//! CLI command implementations.

pub mod doctor;
pub mod flags;
pub mod generate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use ntc_targets::{Architecture, BuildConfig, Platform};
use ntc_toolchain::{
    create, BackendKind, HostInfo, Preferences, Toolchain, ToolchainContext, Xcrun,
};

/// Options shared by every command that constructs a toolchain.
#[derive(Args, Debug, Clone)]
pub struct ToolchainArgs {
    /// Target platform (windows, linux, macosx, ios, android, raspberrypi, bsd)
    #[arg(long)]
    pub target: Option<Platform>,
    /// Toolchain backend (clang, xcode); defaults per target
    #[arg(long)]
    pub backend: Option<BackendKind>,
    /// Project name used for the compile define
    #[arg(long, default_value = "project")]
    pub project: String,
    /// Architectures to build (repeatable; defaults per target)
    #[arg(long = "arch")]
    pub archs: Vec<Architecture>,
    /// Build configurations (repeatable; default: all)
    #[arg(long = "config")]
    pub configs: Vec<BuildConfig>,
    /// Include path applied to every compile (repeatable)
    #[arg(long = "include")]
    pub include_paths: Vec<String>,
    /// Library search path applied to every link (repeatable)
    #[arg(long = "libpath")]
    pub lib_paths: Vec<String>,
    /// Preferences file (.json, otherwise TOML)
    #[arg(long)]
    pub prefs: Option<PathBuf>,
    /// Link all modules into one binary
    #[arg(long)]
    pub monolithic: bool,
}

impl ToolchainArgs {
    pub fn target(&self) -> Platform {
        self.target.unwrap_or_else(Platform::current)
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
            .unwrap_or_else(|| BackendKind::default_for(self.target()))
    }

    pub fn preferences(&self) -> Result<Preferences> {
        match &self.prefs {
            Some(path) => Preferences::load(path)
                .with_context(|| format!("failed to load preferences from {}", path.display())),
            None => Ok(Preferences::default()),
        }
    }

    pub fn context(&self) -> ToolchainContext {
        let mut ctx = ToolchainContext::new(&self.project, HostInfo::detect(), self.target())
            .with_include_paths(self.include_paths.clone())
            .with_lib_paths(self.lib_paths.clone())
            .monolithic(self.monolithic);
        if !self.archs.is_empty() {
            ctx = ctx.with_archs(self.archs.clone());
        }
        if !self.configs.is_empty() {
            ctx = ctx.with_configs(self.configs.clone());
        }
        ctx
    }

    /// Construct the selected backend, querying `xcrun` for Apple tools.
    pub fn toolchain(&self) -> Result<Box<dyn Toolchain>> {
        let prefs = self.preferences()?;
        let backend = self.backend();
        create(backend, self.context(), &prefs, &Xcrun)
            .with_context(|| format!("failed to set up {backend} toolchain for {}", self.target()))
    }
}

/// Format of `ntc generate` output.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Ninja,
    Json,
}


#[cfg(test)]
mod tests {
    use super::test_support::linux_args;
    use super::*;

    #[test]
    fn backend_follows_target() {
        let mut args = linux_args();
        assert_eq!(args.backend(), BackendKind::Clang);
        args.target = Some(Platform::Ios);
        assert_eq!(args.backend(), BackendKind::Xcode);
        args.backend = Some(BackendKind::Clang);
        assert_eq!(args.backend(), BackendKind::Clang);
    }

    #[test]
    fn context_keeps_defaults_when_unset() {
        let mut args = linux_args();
        let ctx = args.context();
        assert_eq!(ctx.archs, [Architecture::X86_64]);
        assert_eq!(ctx.configs.len(), 4);

        args.archs = vec![Architecture::X86];
        args.configs = vec![BuildConfig::Release];
        let ctx = args.context();
        assert_eq!(ctx.archs, [Architecture::X86]);
        assert_eq!(ctx.configs, [BuildConfig::Release]);
    }

    #[test]
    fn preferences_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "[clang]\ntoolchain = \"/opt/llvm/bin\"\n").unwrap();
        let mut args = linux_args();
        args.prefs = Some(path);
        let prefs = args.preferences().unwrap();
        assert_eq!(prefs.clang.toolchain.as_deref(), Some("/opt/llvm/bin"));

        args.prefs = Some(dir.path().join("missing.json"));
        assert!(args.preferences().is_err());
    }
}
