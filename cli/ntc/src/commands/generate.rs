//! `ntc generate`: write a ninja (or JSON) toolchain description.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use ntc_toolchain::{
    build, write_rules, write_variables, BuildRequest, BuildWriter, NinjaWriter, Recorder,
    Toolchain,
};

use super::{OutputFormat, ToolchainArgs};

/// Generate the description and write it to `output` (or stdout).
pub fn run(
    args: &ToolchainArgs,
    requests: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let toolchain = args.toolchain()?;
    let requests = match requests {
        Some(path) => load_requests(path)?,
        None => Vec::new(),
    };

    // An existing output file is only replaced once every request succeeded.
    let mut buf = Vec::new();
    render(toolchain.as_ref(), &requests, format, &mut buf)?;

    match output {
        Some(path) => {
            std::fs::write(path, &buf)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), requests = requests.len(), "wrote build description");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&buf)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Parse a JSON array of build requests.
pub fn load_requests(path: &Path) -> Result<Vec<BuildRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid build requests in {}", path.display()))
}

/// Emit variables, rules and every request through the chosen writer.
pub fn render(
    toolchain: &dyn Toolchain,
    requests: &[BuildRequest],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Ninja => {
            let mut writer = NinjaWriter::new(out);
            emit(toolchain, requests, &mut writer)
        }
        OutputFormat::Json => {
            let mut recorder = Recorder::new();
            emit(toolchain, requests, &mut recorder)?;
            serde_json::to_writer_pretty(&mut *out, &recorder)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

fn emit(
    toolchain: &dyn Toolchain,
    requests: &[BuildRequest],
    writer: &mut dyn BuildWriter,
) -> Result<()> {
    write_variables(toolchain, writer)?;
    write_rules(toolchain, writer)?;
    for request in requests {
        build(toolchain, writer, request)
            .with_context(|| format!("failed to emit {}", request.output))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ntc_targets::Architecture;

    use super::*;
    use crate::commands::test_support::linux_args;

    const REQUESTS: &str = r#"[
        {"kind": "object", "config": "release", "archs": ["x86-64"],
         "inputs": ["src/main.c"], "output": "build/main.o"},
        {"kind": "multi-executable", "config": "debug", "archs": ["x86", "x86-64"],
         "inputs": ["build/main.o"], "output": "bin/app",
         "options": {"libs": ["m"]}}
    ]"#;

    fn requests(dir: &Path) -> Vec<BuildRequest> {
        let path = dir.join("requests.json");
        std::fs::write(&path, REQUESTS).unwrap();
        load_requests(&path).unwrap()
    }

    fn x86_args() -> ToolchainArgs {
        let mut args = linux_args();
        args.archs = vec![Architecture::X86, Architecture::X86_64];
        args
    }

    #[test]
    fn writes_ninja_file() {
        let dir = tempfile::tempdir().unwrap();
        let requests_path = dir.path().join("requests.json");
        std::fs::write(&requests_path, REQUESTS).unwrap();
        let output = dir.path().join("build.ninja");

        run(
            &x86_args(),
            Some(&requests_path),
            OutputFormat::Ninja,
            Some(&output),
        )
        .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("rule cc\n"));
        assert!(text.contains("build build/main.o: cc src/main.c\n"));
        assert!(text.contains("  cconfigflags = -DBUILD_RELEASE=1 -O3 -g -funroll-loops\n"));
        assert!(text.contains("build bin/x86/app: link build/x86/main.o\n"));
        assert!(text.contains("build bin/x86-64/app: link build/x86-64/main.o\n"));
        assert!(text.contains("  libs = -lm\n"));
    }

    #[test]
    fn json_output_records_statements() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = x86_args().toolchain().unwrap();
        let mut out = Vec::new();
        render(
            toolchain.as_ref(),
            &requests(dir.path()),
            OutputFormat::Json,
            &mut out,
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let builds = json["builds"].as_array().unwrap();
        assert_eq!(builds.len(), 3);
        assert_eq!(builds[0]["rule"], "cc");
        assert_eq!(builds[2]["outputs"][0], "bin/x86-64/app");
        assert!(json["rules"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r["name"] == "so"));
    }

    #[test]
    fn failed_request_keeps_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let requests_path = dir.path().join("requests.json");
        std::fs::write(&requests_path, REQUESTS).unwrap();
        let output = dir.path().join("build.ninja");
        std::fs::write(&output, "# previous\n").unwrap();

        // Only x86-64 is enabled, so the multi-executable request is rejected.
        let err = run(
            &linux_args(),
            Some(&requests_path),
            OutputFormat::Ninja,
            Some(&output),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("bin/app"));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "# previous\n");
    }

    #[test]
    fn rejects_malformed_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.json");
        std::fs::write(&path, r#"[{"kind": "dylib"}]"#).unwrap();
        assert!(load_requests(&path).is_err());
    }
}
