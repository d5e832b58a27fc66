//! The machine the toolchain runs on.

use std::process::Command;

use ntc_targets::Platform;

use crate::error::{Result, ToolchainError};

/// Host operating system and whether it runs the NDK's x86-64 prebuilts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostInfo {
    pub platform: Platform,
    pub is_x86_64: bool,
}

impl HostInfo {
    pub fn new(platform: Platform, is_x86_64: bool) -> Self {
        Self {
            platform,
            is_x86_64,
        }
    }

    /// Describe the running machine. The CPU is queried at runtime
    /// (`PROCESSOR_ARCHITECTURE` on Windows, `uname -m` elsewhere), not taken
    /// from the architecture this binary was compiled for.
    pub fn detect() -> Self {
        let platform = Platform::current();
        let is_x86_64 = match platform {
            Platform::Windows => windows_is_x86_64(
                std::env::var("PROCESSOR_ARCHITEW6432").ok().as_deref(),
                std::env::var("PROCESSOR_ARCHITECTURE").ok().as_deref(),
            ),
            Platform::MacOsx => true,
            _ => machine_name().as_deref() == Some("x86_64"),
        };
        tracing::debug!(%platform, is_x86_64, "detected host");
        Self::new(platform, is_x86_64)
    }

    /// Executable suffix for host tools.
    pub fn exe_suffix(&self) -> &'static str {
        self.platform.exe_suffix()
    }

    /// Shell command that removes `path` if it exists.
    pub fn rm_command(&self, path: &str) -> String {
        if self.platform.is_windows() {
            format!("cmd /C (IF exist {path} (del /F /Q {path}))")
        } else {
            format!("rm -f {path}")
        }
    }

    /// Label of the prebuilt native-toolchain directory for this host,
    /// as laid out in the Android NDK.
    pub fn native_toolchain_label(&self) -> Result<&'static str> {
        match self.platform {
            Platform::Windows if self.is_x86_64 => Ok("windows-x86_64"),
            Platform::Windows => Ok("windows-x86"),
            Platform::Linux if self.is_x86_64 => Ok("linux-x86_64"),
            Platform::Linux => Ok("linux-x86"),
            Platform::MacOsx => Ok("darwin-x86_64"),
            platform => Err(ToolchainError::UnsupportedHost { platform }),
        }
    }
}

/// A 32-bit process on 64-bit Windows sees `x86` in `PROCESSOR_ARCHITECTURE`
/// and the real CPU in `PROCESSOR_ARCHITEW6432`. Unset means `AMD64`.
fn windows_is_x86_64(wow64: Option<&str>, arch: Option<&str>) -> bool {
    wow64.or(arch).unwrap_or("AMD64").contains("64")
}

/// `uname -m`, or `None` when it cannot be run.
fn machine_name() -> Option<String> {
    let output = Command::new("uname").arg("-m").output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_labels() {
        let label = |p, b| HostInfo::new(p, b).native_toolchain_label().unwrap();
        assert_eq!(label(Platform::Windows, true), "windows-x86_64");
        assert_eq!(label(Platform::Windows, false), "windows-x86");
        assert_eq!(label(Platform::Linux, true), "linux-x86_64");
        assert_eq!(label(Platform::Linux, false), "linux-x86");
        assert_eq!(label(Platform::MacOsx, true), "darwin-x86_64");
    }

    #[test]
    fn unsupported_host_label() {
        let err = HostInfo::new(Platform::Bsd, true)
            .native_toolchain_label()
            .unwrap_err();
        assert!(matches!(err, ToolchainError::UnsupportedHost { .. }));
    }

    #[test]
    fn rm_command_per_host() {
        assert_eq!(
            HostInfo::new(Platform::Linux, true).rm_command("$out"),
            "rm -f $out"
        );
        assert!(HostInfo::new(Platform::Windows, true)
            .rm_command("$out")
            .starts_with("cmd /C"));
    }

    #[test]
    fn windows_cpu_from_environment() {
        assert!(windows_is_x86_64(None, Some("AMD64")));
        assert!(windows_is_x86_64(Some("AMD64"), Some("x86")));
        assert!(!windows_is_x86_64(None, Some("x86")));
        assert!(windows_is_x86_64(None, None));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_host_follows_uname() {
        let host = HostInfo::detect();
        assert_eq!(host.platform, Platform::Linux);
        assert_eq!(host.is_x86_64, machine_name().as_deref() == Some("x86_64"));
    }
}
