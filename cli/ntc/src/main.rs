//! ntc CLI: generate ninja toolchain descriptions and inspect resolved toolchains.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use ntc_targets::{Architecture, ArtifactKind, BuildConfig};

use commands::{OutputFormat, ToolchainArgs};

#[derive(Parser)]
#[command(name = "ntc", version, about = "Ninja toolchain generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write toolchain variables, rules and requested build statements
    Generate {
        #[command(flatten)]
        toolchain: ToolchainArgs,
        /// JSON file with a list of build requests
        #[arg(long)]
        requests: Option<PathBuf>,
        /// Output format (ninja, json)
        #[arg(long, default_value = "ninja")]
        format: OutputFormat,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the composed flags for one architecture, configuration and kind
    Flags {
        #[command(flatten)]
        toolchain: ToolchainArgs,
        /// Architecture (x86, x86-64, arm6, arm7, arm64, mips, mips64)
        #[arg(long)]
        arch: Architecture,
        /// Build configuration (debug, release, profile, deploy)
        #[arg(long, default_value = "debug")]
        config: BuildConfig,
        /// Artifact kind (object, static-lib, shared-lib, executable, multi-*)
        #[arg(long, default_value = "object")]
        kind: ArtifactKind,
    },
    /// Show the resolved toolchain and its tool versions
    Doctor {
        #[command(flatten)]
        toolchain: ToolchainArgs,
    },
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            toolchain,
            requests,
            format,
            output,
        } => commands::generate::run(&toolchain, requests.as_deref(), format, output.as_deref()),
        Commands::Flags {
            toolchain,
            arch,
            config,
            kind,
        } => commands::flags::run(&toolchain, arch, config, kind),
        Commands::Doctor { toolchain } => commands::doctor::run(&toolchain),
    }
}
