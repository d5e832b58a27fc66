//! `ntc doctor`: toolchain diagnostics.

use anyhow::Result;

use ntc_toolchain::locator::tool_version;
use ntc_toolchain::Toolchain;

use super::ToolchainArgs;

/// Variables worth showing when present, in display order.
const PATH_VARIABLES: &[&str] = &[
    "toolchain",
    "cc",
    "ar",
    "link",
    "ndk",
    "sdk",
    "buildtools",
    "androidjar",
    "sdkpath",
    "deploymenttarget",
];

/// Print toolchain diagnostic information.
pub fn run(args: &ToolchainArgs) -> Result<()> {
    println!("=== ntc doctor ===");
    println!();
    println!("ntc version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let ctx = args.context();
    println!("--- Host ---");
    println!("  Platform: {}", ctx.host.platform);
    println!("  x86-64:   {}", ctx.host.is_x86_64);
    match ctx.host.native_toolchain_label() {
        Ok(label) => println!("  NDK prebuilt label: {label}"),
        Err(e) => println!("  NDK prebuilt label: {e}"),
    }
    println!();

    println!("--- Target ---");
    println!("  Platform: {}", ctx.target);
    println!("  Backend:  {}", args.backend());
    let archs: Vec<String> = ctx.archs.iter().map(ToString::to_string).collect();
    println!("  Archs:    {}", archs.join(" "));
    println!();

    println!("--- Toolchain ---");
    match args.toolchain() {
        Ok(toolchain) => report(toolchain.as_ref())?,
        Err(e) => println!("  error: {e:#}"),
    }
    Ok(())
}

fn report(toolchain: &dyn Toolchain) -> Result<()> {
    let vars = toolchain.variables()?;
    for name in PATH_VARIABLES {
        if let Some(value) = vars.get(name) {
            let value = value.render();
            println!("  {name:<16} {}", if value.is_empty() { "(unset)" } else { value.as_str() });
        }
    }
    let rules: Vec<&str> = toolchain.rules().iter().map(|r| r.name.as_str()).collect();
    println!("  rules:           {}", rules.join(" "));

    if toolchain.name() == "clang" {
        println!();
        println!("--- Tools ---");
        let prefix = vars.get("toolchain").map(|v| v.render()).unwrap_or_default();
        for tool in ["cc", "ar"] {
            let Some(program) = vars.get(tool).map(|v| format!("{prefix}{}", v.render())) else {
                continue;
            };
            match tool_version(&program) {
                Some(version) => println!("  {program}: {version}"),
                None => println!("  {program}: not found"),
            }
        }
    }
    Ok(())
}
