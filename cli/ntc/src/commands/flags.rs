//! `ntc flags`: show the flags composed for one build combination.

use anyhow::Result;

use ntc_targets::{Architecture, ArtifactKind, BuildConfig};
use ntc_toolchain::{FlagComposer, FlagSet, Toolchain};

/// Print the per-axis flag sets, one `name: tokens` line each.
pub fn run(
    args: &super::ToolchainArgs,
    arch: Architecture,
    config: BuildConfig,
    kind: ArtifactKind,
) -> Result<()> {
    let toolchain = args.toolchain()?;
    println!(
        "{} toolchain, {} {arch} {config} {kind}",
        toolchain.name(),
        toolchain.target()
    );
    for (name, flags) in compose(toolchain.as_ref(), arch, config, kind)? {
        println!("  {name:<16} {flags}");
    }
    Ok(())
}

/// Every per-axis flag set and the composite sets, in precedence order.
pub fn compose(
    toolchain: &dyn Toolchain,
    arch: Architecture,
    config: BuildConfig,
    kind: ArtifactKind,
) -> Result<Vec<(&'static str, FlagSet)>> {
    Ok(vec![
        ("carchflags", toolchain.arch_compile_flags(arch, kind)?),
        ("cconfigflags", toolchain.config_compile_flags(config, kind)),
        ("ckindflags", toolchain.kind_compile_flags(kind)),
        ("ararchflags", toolchain.arch_archive_flags(arch, kind)?),
        ("arconfigflags", toolchain.config_archive_flags(config, kind)),
        ("linkarchflags", toolchain.arch_link_flags(arch, kind)?),
        ("linkconfigflags", toolchain.config_link_flags(config, kind)),
        ("compile", toolchain.compile_flags(arch, config, kind)?),
        ("archive", toolchain.archive_flags(arch, config, kind)?),
        ("link", toolchain.link_flags(arch, config, kind)?),
    ])
}
