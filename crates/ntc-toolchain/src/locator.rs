//! External SDK discovery.
//!
//! Apple toolchains are located by asking `xcrun`. The [`ToolLocator`] trait
//! keeps that behind a seam so resolution can run without Xcode installed.

use std::process::Command;

use crate::error::{Result, ToolchainError};

/// Answers SDK and tool location queries for an Apple SDK name
/// (`macosx`, `iphoneos`, ...).
pub trait ToolLocator {
    /// Root of the SDK platform (`xcrun --sdk <sdk> --show-sdk-platform-path`).
    fn platform_path(&self, sdk: &str) -> Result<String>;

    /// Root of the SDK itself (`xcrun --sdk <sdk> --show-sdk-path`).
    fn sdk_path(&self, sdk: &str) -> Result<String>;

    /// Absolute path of a developer tool (`xcrun --sdk <sdk> -f <tool>`).
    fn find_tool(&self, sdk: &str, tool: &str) -> Result<String>;
}

/// Locator backed by the `xcrun` binary on the search path.
///
/// Calls block until `xcrun` exits; there is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xcrun;

impl Xcrun {
    fn query(&self, args: &[&str]) -> Result<String> {
        let tool = format!("xcrun {}", args.join(" "));
        let output = Command::new("xcrun")
            .args(args)
            .output()
            .map_err(|e| ToolchainError::Discovery {
                tool: tool.clone(),
                detail: format!("failed to spawn: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolchainError::Discovery {
                tool,
                detail: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            return Err(ToolchainError::Discovery {
                tool,
                detail: "empty output".into(),
            });
        }
        tracing::debug!(%tool, result = %stdout, "located");
        Ok(stdout)
    }
}

impl ToolLocator for Xcrun {
    fn platform_path(&self, sdk: &str) -> Result<String> {
        self.query(&["--sdk", sdk, "--show-sdk-platform-path"])
    }

    fn sdk_path(&self, sdk: &str) -> Result<String> {
        self.query(&["--sdk", sdk, "--show-sdk-path"])
    }

    fn find_tool(&self, sdk: &str, tool: &str) -> Result<String> {
        self.query(&["--sdk", sdk, "-f", tool])
    }
}

/// Version banner of an executable (first line of `--version`).
///
/// Returns `None` when the tool cannot be spawned.
pub fn tool_version(program: &str) -> Option<String> {
    let output = Command::new(program).arg("--version").output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    Some(
        text.lines()
            .next()
            .unwrap_or("(unknown version)")
            .trim()
            .to_string(),
    )
}
