//! Android NDK/SDK resolution.
//!
//! Resolves the LLVM toolchain inside the NDK, the per-architecture GCC
//! toolchains and sysroots, and the newest SDK build-tools directory.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use ntc_targets::Architecture;

use crate::error::{Result, ToolchainError};
use crate::host::HostInfo;
use crate::prefs::{override_with, AndroidPrefs};
use crate::version::select_highest;

/// API level used when no preference is given.
pub const DEFAULT_PLATFORM_VERSION: &str = "21";

/// Version suffix of the GCC toolchains shipped in the NDK.
pub const GCC_TOOLCHAIN_VERSION: &str = "4.9";

/// Directory name of an architecture under `platforms/android-N/arch-*`.
pub fn abi_name(arch: Architecture) -> &'static str {
    match arch {
        Architecture::X86 => "x86",
        Architecture::X86_64 => "x86_64",
        Architecture::Arm6 | Architecture::Arm7 => "arm",
        Architecture::Arm64 => "arm64",
        Architecture::Mips => "mips",
        Architecture::Mips64 => "mips64",
    }
}

/// Clang `-target` triple.
pub fn target_triple(arch: Architecture) -> &'static str {
    match arch {
        Architecture::X86 => "i686-none-linux-android",
        Architecture::X86_64 => "x86_64-none-linux-android",
        Architecture::Arm6 => "armv5te-none-linux-androideabi",
        Architecture::Arm7 => "armv7-none-linux-androideabi",
        Architecture::Arm64 => "aarch64-none-linux-android",
        Architecture::Mips => "mipsel-none-linux-android",
        Architecture::Mips64 => "mips64el-none-linux-android",
    }
}

/// GCC toolchain directory name under `<ndk>/toolchains/`.
pub fn gcc_toolchain_name(arch: Architecture) -> String {
    let base = match arch {
        Architecture::X86 => "x86",
        Architecture::X86_64 => "x86_64",
        Architecture::Arm6 | Architecture::Arm7 => "arm-linux-androideabi",
        Architecture::Arm64 => "aarch64-linux-android",
        Architecture::Mips => "mipsel-linux-android",
        Architecture::Mips64 => "mips64el-linux-android",
    };
    format!("{base}-{GCC_TOOLCHAIN_VERSION}")
}

/// Binary prefix of the GCC tools, e.g. `arm-linux-androideabi-`.
pub fn gcc_prefix(arch: Architecture) -> &'static str {
    match arch {
        Architecture::X86 => "i686-linux-android-",
        Architecture::X86_64 => "x86_64-linux-android-",
        Architecture::Arm6 | Architecture::Arm7 => "arm-linux-androideabi-",
        Architecture::Arm64 => "aarch64-linux-android-",
        Architecture::Mips => "mipsel-linux-android-",
        Architecture::Mips64 => "mips64el-linux-android-",
    }
}

/// Whether clang needs an explicit `-gcc-toolchain` to find binutils.
pub fn needs_gcc_toolchain_flag(arch: Architecture) -> bool {
    matches!(arch, Architecture::Mips | Architecture::Mips64)
}

/// NDK/SDK roots and API level before discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidRoots {
    pub ndk: String,
    pub sdk: String,
    pub platform_version: String,
}

impl AndroidRoots {
    /// Roots from `NDK_HOME` and `ANDROID_HOME`; unset variables give
    /// empty roots.
    pub fn from_env() -> Self {
        Self {
            ndk: std::env::var("NDK_HOME").unwrap_or_default(),
            sdk: std::env::var("ANDROID_HOME").unwrap_or_default(),
            platform_version: DEFAULT_PLATFORM_VERSION.into(),
        }
    }

    /// Apply the `android` preference section on top.
    pub fn with_prefs(mut self, prefs: &AndroidPrefs) -> Self {
        override_with(&mut self.ndk, prefs.ndkpath.as_ref());
        override_with(&mut self.sdk, prefs.sdkpath.as_ref());
        override_with(&mut self.platform_version, prefs.platformversion.as_ref());
        self
    }
}

/// SDK tools used to package Android applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkTools {
    /// Newest `<sdk>/build-tools/<version>` directory.
    pub build_tools: PathBuf,
    pub android_jar: PathBuf,
    pub dex: PathBuf,
    pub aapt: PathBuf,
    pub zipalign: PathBuf,
    pub javac: String,
    pub jarsigner: String,
}

/// Resolved Android toolchain locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidPaths {
    pub ndk: String,
    pub sdk: String,
    pub platform_version: String,
    pub host_label: &'static str,
    /// LLVM `bin/` directory with a trailing separator, or empty when the
    /// NDK root is unknown.
    pub toolchain: String,
    /// `None` when the SDK root is unknown.
    pub sdk_tools: Option<SdkTools>,
}

impl AndroidPaths {
    /// Resolve NDK and SDK locations for `host`.
    ///
    /// Unset roots are carried as empty strings; statements that need them
    /// fail later with [`ToolchainError::MissingPreference`].
    pub fn resolve(host: &HostInfo, roots: AndroidRoots) -> Result<Self> {
        let host_label = host.native_toolchain_label()?;

        let toolchain = if roots.ndk.is_empty() {
            tracing::warn!("NDK root is not set; android statements will fail to emit");
            String::new()
        } else {
            let bin = Path::new(&roots.ndk)
                .join("toolchains")
                .join("llvm")
                .join("prebuilt")
                .join(host_label)
                .join("bin");
            format!("{}{MAIN_SEPARATOR}", bin.display())
        };

        let sdk_tools = if roots.sdk.is_empty() {
            tracing::warn!("SDK root is not set; skipping build-tools discovery");
            None
        } else {
            Some(resolve_sdk_tools(host, &roots.sdk, &roots.platform_version)?)
        };

        Ok(Self {
            ndk: roots.ndk,
            sdk: roots.sdk,
            platform_version: roots.platform_version,
            host_label,
            toolchain,
            sdk_tools,
        })
    }

    /// The NDK root, or an error naming the preference that sets it.
    pub fn require_ndk(&self) -> Result<&str> {
        if self.ndk.is_empty() {
            return Err(ToolchainError::MissingPreference {
                key: "android.ndkpath",
                hint: "set it in the preferences file or export NDK_HOME",
            });
        }
        Ok(&self.ndk)
    }

    /// `<ndk>/platforms/android-<api>/arch-<abi>`.
    pub fn sysroot(&self, arch: Architecture) -> Result<String> {
        let path = Path::new(self.require_ndk()?)
            .join("platforms")
            .join(format!("android-{}", self.platform_version))
            .join(format!("arch-{}", abi_name(arch)));
        Ok(path.display().to_string())
    }

    /// `<ndk>/toolchains/<gcc toolchain>/prebuilt/<host label>`.
    pub fn gcc_toolchain(&self, arch: Architecture) -> Result<String> {
        let path = Path::new(self.require_ndk()?)
            .join("toolchains")
            .join(gcc_toolchain_name(arch))
            .join("prebuilt")
            .join(self.host_label);
        Ok(path.display().to_string())
    }

    /// GCC tool prefix including directory, e.g.
    /// `<gcc toolchain>/bin/arm-linux-androideabi-`.
    pub fn gcc_bin_prefix(&self, arch: Architecture) -> Result<String> {
        let bin = Path::new(&self.gcc_toolchain(arch)?).join("bin");
        Ok(format!("{}{MAIN_SEPARATOR}{}", bin.display(), gcc_prefix(arch)))
    }
}

fn resolve_sdk_tools(host: &HostInfo, sdk: &str, platform_version: &str) -> Result<SdkTools> {
    let sdk = Path::new(sdk);
    let build_tools_root = sdk.join("build-tools");

    let unreadable = |source| ToolchainError::Unreadable {
        path: build_tools_root.clone(),
        source,
    };
    let mut versions = Vec::new();
    for entry in std::fs::read_dir(&build_tools_root).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        if entry.file_type().map_err(unreadable)?.is_dir() {
            versions.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    let newest = select_highest(versions.iter().map(String::as_str)).ok_or_else(|| {
        ToolchainError::NoBuildTools {
            path: build_tools_root.clone(),
        }
    })?;
    let build_tools = build_tools_root.join(newest);
    tracing::debug!(build_tools = %build_tools.display(), "selected build-tools");

    let exe = host.exe_suffix();
    let dex_name = if host.platform.is_windows() {
        "dx.bat".to_string()
    } else {
        format!("dx{exe}")
    };
    let zipalign_name = format!("zipalign{exe}");
    let dex = with_fallback(build_tools.join(&dex_name), sdk.join("tools").join(&dex_name));
    let zipalign = with_fallback(
        build_tools.join(&zipalign_name),
        sdk.join("tools").join(&zipalign_name),
    );

    Ok(SdkTools {
        aapt: build_tools.join(format!("aapt{exe}")),
        android_jar: sdk
            .join("platforms")
            .join(format!("android-{platform_version}"))
            .join("android.jar"),
        dex,
        zipalign,
        build_tools,
        javac: "javac".into(),
        jarsigner: "jarsigner".into(),
    })
}

fn with_fallback(primary: PathBuf, fallback: PathBuf) -> PathBuf {
    if primary.is_file() {
        primary
    } else {
        tracing::debug!(
            missing = %primary.display(),
            fallback = %fallback.display(),
            "using fallback tool location"
        );
        fallback
    }
}

#[cfg(test)]
mod tests {
    use ntc_targets::Platform;

    use super::*;

    fn linux_host() -> HostInfo {
        HostInfo::new(Platform::Linux, true)
    }

    fn sdk_with_build_tools(versions: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for v in versions {
            std::fs::create_dir_all(dir.path().join("build-tools").join(v)).unwrap();
        }
        dir
    }

    fn roots(ndk: &str, sdk: &str) -> AndroidRoots {
        AndroidRoots {
            ndk: ndk.into(),
            sdk: sdk.into(),
            platform_version: DEFAULT_PLATFORM_VERSION.into(),
        }
    }

    #[test]
    fn arm7_triple() {
        assert_eq!(target_triple(Architecture::Arm7), "armv7-none-linux-androideabi");
    }

    #[test]
    fn every_architecture_has_table_entries() {
        for arch in Architecture::ALL {
            assert!(!abi_name(arch).is_empty());
            assert!(target_triple(arch).contains("-none-linux-android"));
            assert!(gcc_toolchain_name(arch).ends_with("-4.9"));
            assert!(gcc_prefix(arch).ends_with('-'));
        }
    }

    #[test]
    fn selects_numerically_highest_build_tools() {
        let sdk = sdk_with_build_tools(&["9.0.0", "23.0.1", "10.0.2"]);
        let sdk_path = sdk.path().display().to_string();
        let paths = AndroidPaths::resolve(&linux_host(), roots("/ndk", &sdk_path)).unwrap();
        let tools = paths.sdk_tools.unwrap();
        assert_eq!(tools.build_tools, sdk.path().join("build-tools").join("23.0.1"));
        assert_eq!(
            tools.android_jar,
            sdk.path().join("platforms/android-21/android.jar")
        );
    }

    #[test]
    fn empty_build_tools_is_fatal() {
        let sdk = sdk_with_build_tools(&[]);
        std::fs::create_dir_all(sdk.path().join("build-tools")).unwrap();
        let sdk_path = sdk.path().display().to_string();
        let err = AndroidPaths::resolve(&linux_host(), roots("/ndk", &sdk_path)).unwrap_err();
        assert!(matches!(err, ToolchainError::NoBuildTools { .. }));
    }

    #[test]
    fn missing_build_tools_dir_is_fatal() {
        let sdk = tempfile::tempdir().unwrap();
        let sdk_path = sdk.path().display().to_string();
        let err = AndroidPaths::resolve(&linux_host(), roots("/ndk", &sdk_path)).unwrap_err();
        assert!(matches!(err, ToolchainError::Unreadable { .. }));
        let message = err.to_string();
        assert!(message.contains(&sdk.path().join("build-tools").display().to_string()));
    }

    #[test]
    fn dex_and_zipalign_fall_back_to_tools_dir() {
        let sdk = sdk_with_build_tools(&["25.0.0"]);
        let bt = sdk.path().join("build-tools").join("25.0.0");
        std::fs::write(bt.join("zipalign"), "").unwrap();
        let sdk_path = sdk.path().display().to_string();
        let tools = AndroidPaths::resolve(&linux_host(), roots("/ndk", &sdk_path))
            .unwrap()
            .sdk_tools
            .unwrap();
        assert_eq!(tools.zipalign, bt.join("zipalign"));
        assert_eq!(tools.dex, sdk.path().join("tools").join("dx"));
        assert_eq!(tools.aapt, bt.join("aapt"));
    }

    #[test]
    fn per_architecture_paths() {
        let paths = AndroidPaths::resolve(&linux_host(), roots("/ndk", "")).unwrap();
        assert_eq!(paths.toolchain, "/ndk/toolchains/llvm/prebuilt/linux-x86_64/bin/");
        assert_eq!(
            paths.sysroot(Architecture::Arm64).unwrap(),
            "/ndk/platforms/android-21/arch-arm64"
        );
        assert_eq!(
            paths.gcc_toolchain(Architecture::Mips).unwrap(),
            "/ndk/toolchains/mipsel-linux-android-4.9/prebuilt/linux-x86_64"
        );
        assert_eq!(
            paths.gcc_bin_prefix(Architecture::Arm7).unwrap(),
            "/ndk/toolchains/arm-linux-androideabi-4.9/prebuilt/linux-x86_64/bin/arm-linux-androideabi-"
        );
        assert!(paths.sdk_tools.is_none());
    }

    #[test]
    fn unset_ndk_fails_when_used() {
        let paths = AndroidPaths::resolve(&linux_host(), roots("", "")).unwrap();
        assert!(paths.toolchain.is_empty());
        let err = paths.sysroot(Architecture::X86).unwrap_err();
        assert!(err.to_string().contains("android.ndkpath"));
    }

    #[test]
    fn prefs_override_roots() {
        let prefs = AndroidPrefs {
            ndkpath: Some("/opt/ndk".into()),
            sdkpath: None,
            platformversion: Some("24".into()),
        };
        let r = roots("/env/ndk", "/env/sdk").with_prefs(&prefs);
        assert_eq!(r.ndk, "/opt/ndk");
        assert_eq!(r.sdk, "/env/sdk");
        assert_eq!(r.platform_version, "24");
    }
}
