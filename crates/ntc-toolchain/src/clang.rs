//! Clang toolchain for desktop, embedded-OS and Android targets.

use std::path::{Path, MAIN_SEPARATOR};

use ntc_targets::{Architecture, ArtifactKind, BuildConfig, Platform};

use crate::android::{self, AndroidPaths, AndroidRoots};
use crate::error::Result;
use crate::flags::{
    self, include_path_flags, library_flags, library_path_flags, linker_passthrough, FlagComposer,
    FlagSet,
};
use crate::lifecycle::{Lifecycle, Stage};
use crate::prefs::{override_with, Preferences};
use crate::toolchain::{
    common_archive_bindings, common_compile_bindings, common_link_bindings, require_archs,
    LocalOptions, Toolchain, ToolchainContext,
};
use crate::writer::{Bindings, Rule};

/// Warning and math flags every clang-family compile starts from.
const BASE_CFLAGS: &[&str] = &[
    "-std=c11",
    "-W",
    "-Werror",
    "-pedantic",
    "-Wall",
    "-Weverything",
    "-Wno-padded",
    "-Wno-documentation-unknown-command",
    "-funit-at-a-time",
    "-fstrict-aliasing",
    "-fno-math-errno",
    "-ffinite-math-only",
    "-funsafe-math-optimizations",
    "-fno-trapping-math",
    "-ffast-math",
];

/// Base compile flags for `project`.
pub fn base_cflags(project: &str, monolithic: bool) -> FlagSet {
    let define: String = project
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    let mut flags = FlagSet::new();
    flags.push(BASE_CFLAGS[0]);
    flags.push(format!("-D{define}_COMPILE=1"));
    flags.extend(BASE_CFLAGS[1..].iter().copied());
    if monolithic {
        flags.push("-DBUILD_MONOLITHIC=1");
    }
    flags
}

/// Append a path separator to a non-empty toolchain prefix.
fn with_trailing_separator(mut root: String) -> String {
    if !root.is_empty() && !root.ends_with('/') && !root.ends_with('\\') {
        root.push(MAIN_SEPARATOR);
    }
    root
}

/// Clang backend.
#[derive(Debug, Clone)]
pub struct ClangToolchain {
    ctx: ToolchainContext,
    /// Prefix of `cc`/`ar` (a directory with trailing separator, or empty).
    toolchain: String,
    cc: String,
    ar: String,
    link: String,
    include_paths: Vec<String>,
    cflags: FlagSet,
    arflags: FlagSet,
    linkflags: FlagSet,
    oslibs: Vec<String>,
    android: Option<AndroidPaths>,
    rules: Vec<Rule>,
}

impl ClangToolchain {
    /// Build a ready clang backend. Android roots default to `NDK_HOME` and
    /// `ANDROID_HOME`.
    pub fn new(ctx: ToolchainContext, prefs: &Preferences) -> Result<Self> {
        Self::with_android_roots(ctx, prefs, AndroidRoots::from_env())
    }

    /// Build a ready clang backend from explicit Android roots; the
    /// `android` preferences still override them.
    pub fn with_android_roots(
        ctx: ToolchainContext,
        prefs: &Preferences,
        roots: AndroidRoots,
    ) -> Result<Self> {
        require_archs(&ctx)?;
        let mut lifecycle = Lifecycle::new("clang");
        let host = ctx.host;
        let target = ctx.target;

        let mut cccmd = String::from(
            "$toolchain$cc -MMD -MT $out -MF $out.d -I. $includepaths $moreincludepaths \
             $cflags $carchflags $cconfigflags $ckindflags -c $in -o $out",
        );
        let arcmd = format!(
            "{} && $toolchain$ar crsD $ararchflags $arflags $arconfigflags $out $in",
            host.rm_command("$out")
        );
        let mut linkcmd = String::from(
            "$toolchain$cc $libpaths $configlibpaths $linkflags $linkarchflags $linkconfigflags \
             -o $out $in $libs $archlibs $oslibs",
        );
        let mut cflags = base_cflags(&ctx.project, ctx.monolithic);
        let arflags = FlagSet::new();
        let mut linkflags = FlagSet::new();
        let mut oslibs: Vec<String> = Vec::new();
        let mut include_paths = ctx.include_paths.clone();
        let mut ar = String::from("llvm-ar");
        lifecycle.advance(Stage::BaseFlagsSet)?;

        let mut solinkcmd = None;
        match target {
            Platform::Windows => {
                cflags.extend(["-U__STRICT_ANSI__", "-Wno-reserved-id-macro"]);
                oslibs.extend(["kernel32", "user32", "shell32", "advapi32"].map(String::from));
            }
            Platform::Android => {
                ar = "ar".into();
                cccmd.push_str(" --sysroot=$sysroot");
                linkcmd.push_str(" -shared -Wl,-soname,$liblinkname --sysroot=$sysroot");
                cflags.extend([
                    "-fpic",
                    "-ffunction-sections",
                    "-funwind-tables",
                    "-fstack-protector",
                    "-fomit-frame-pointer",
                    "-no-canonical-prefixes",
                    "-Wa,--noexecstack",
                ]);
                linkflags.extend([
                    "-no-canonical-prefixes",
                    "-Wl,--no-undefined",
                    "-Wl,-z,noexecstack",
                    "-Wl,-z,relro",
                    "-Wl,-z,now",
                ]);
                let ndk = Path::new("$ndk").join("sources").join("android");
                include_paths.push(ndk.join("native_app_glue").display().to_string());
                include_paths.push(ndk.join("cpufeatures").display().to_string());
                oslibs.push("log".into());
            }
            _ => {
                solinkcmd = Some(format!("{linkcmd} -shared"));
            }
        }
        lifecycle.advance(Stage::PlatformExtended)?;

        let mut toolchain = String::new();
        override_with(&mut toolchain, prefs.clang.toolchain.as_ref());
        let android = if target.is_android() {
            let paths = AndroidPaths::resolve(&host, roots.with_prefs(&prefs.android))?;
            toolchain.clone_from(&paths.toolchain);
            Some(paths)
        } else {
            None
        };
        let toolchain = with_trailing_separator(toolchain);
        lifecycle.advance(Stage::PathsResolved)?;

        let solinkcmd = solinkcmd.unwrap_or_else(|| linkcmd.clone());
        let rules = vec![
            Rule::new("cc", cccmd, "CC $in").with_depfile("$out.d", "gcc"),
            Rule::new("ar", arcmd, "LIB $out"),
            Rule::new("link", linkcmd, "LINK $out"),
            Rule::new("so", solinkcmd, "SO $out"),
        ];
        lifecycle.advance(Stage::RulesRegistered)?;

        let backend = Self {
            ctx,
            toolchain,
            cc: "clang".into(),
            ar,
            link: "clang".into(),
            include_paths,
            cflags,
            arflags,
            linkflags,
            oslibs,
            android,
            rules,
        };
        lifecycle.advance(Stage::Ready)?;
        Ok(backend)
    }

    /// Base compile flags after platform extension.
    pub fn cflags(&self) -> &FlagSet {
        &self.cflags
    }

    pub fn linkflags(&self) -> &FlagSet {
        &self.linkflags
    }

    /// Resolved prefix of the compiler, archiver and linker.
    pub fn toolchain_root(&self) -> &str {
        &self.toolchain
    }

    pub fn android_paths(&self) -> Option<&AndroidPaths> {
        self.android.as_ref()
    }

    /// Android `-target` flags, plus `-gcc-toolchain` where clang needs it.
    fn android_target_flags(&self, paths: &AndroidPaths, arch: Architecture) -> Result<FlagSet> {
        let mut flags = FlagSet::new();
        flags.extend(["-target", android::target_triple(arch)]);
        if android::needs_gcc_toolchain_flag(arch) {
            flags.push("-gcc-toolchain");
            flags.push(paths.gcc_toolchain(arch)?);
        }
        Ok(flags)
    }

    /// Runtime libraries linked per architecture.
    pub fn arch_libraries(&self, arch: Architecture) -> FlagSet {
        if !self.ctx.target.is_android() {
            return FlagSet::new();
        }
        let math = if arch == Architecture::Arm7 { "m_hard" } else { "m" };
        library_flags(&[math, "gcc", "android"])
    }

    fn forward(&self, flags: FlagSet) -> FlagSet {
        linker_passthrough(flags, self.ctx.target)
    }
}

impl FlagComposer for ClangToolchain {
    fn arch_compile_flags(&self, arch: Architecture, _kind: ArtifactKind) -> Result<FlagSet> {
        match &self.android {
            Some(paths) => self.android_target_flags(paths, arch),
            None => Ok(FlagSet::new()),
        }
    }

    fn config_compile_flags(&self, config: BuildConfig, _kind: ArtifactKind) -> FlagSet {
        flags::config_compile_flags(config)
    }

    fn arch_link_flags(&self, arch: Architecture, kind: ArtifactKind) -> Result<FlagSet> {
        self.arch_compile_flags(arch, kind)
    }

    fn config_link_flags(&self, _config: BuildConfig, kind: ArtifactKind) -> FlagSet {
        let mut flags = FlagSet::new();
        if self.ctx.target.is_windows() {
            match kind.base() {
                ArtifactKind::SharedLib => flags.push("/DLL"),
                ArtifactKind::Executable => flags.push("/SUBSYSTEM:CONSOLE"),
                _ => {}
            }
        }
        self.forward(flags)
    }
}

impl Toolchain for ClangToolchain {
    fn name(&self) -> &'static str {
        "clang"
    }

    fn context(&self) -> &ToolchainContext {
        &self.ctx
    }

    fn variables(&self) -> Result<Bindings> {
        let mut vars = Bindings::new();
        if let Some(paths) = &self.android {
            vars.bind("ndk", paths.ndk.as_str())?;
            vars.bind("sdk", paths.sdk.as_str())?;
            vars.bind("sysroot", "")?;
            vars.bind("liblinkname", "")?;
            if let Some(tools) = &paths.sdk_tools {
                vars.bind("buildtools", tools.build_tools.display().to_string())?;
                vars.bind("androidjar", tools.android_jar.display().to_string())?;
                vars.bind("dex", tools.dex.display().to_string())?;
                vars.bind("aapt", tools.aapt.display().to_string())?;
                vars.bind("zipalign", tools.zipalign.display().to_string())?;
                vars.bind("javac", tools.javac.as_str())?;
                vars.bind("jarsigner", tools.jarsigner.as_str())?;
            }
        }
        vars.bind("toolchain", self.toolchain.as_str())?;
        vars.bind("cc", self.cc.as_str())?;
        vars.bind("ar", self.ar.as_str())?;
        vars.bind("link", self.link.as_str())?;
        vars.bind("includepaths", include_path_flags(&self.include_paths))?;
        vars.bind("moreincludepaths", "")?;
        vars.bind("cflags", self.cflags.clone())?;
        vars.bind("carchflags", "")?;
        vars.bind("cconfigflags", "")?;
        vars.bind("ckindflags", "")?;
        vars.bind("arflags", self.arflags.clone())?;
        vars.bind("ararchflags", "")?;
        vars.bind("arconfigflags", "")?;
        vars.bind("linkflags", self.linkflags.clone())?;
        vars.bind("linkarchflags", "")?;
        vars.bind("linkconfigflags", "")?;
        vars.bind("libs", "")?;
        vars.bind(
            "libpaths",
            self.forward(library_path_flags(&self.ctx.lib_paths, self.ctx.target)),
        )?;
        vars.bind("configlibpaths", "")?;
        vars.bind("archlibs", "")?;
        vars.bind("oslibs", library_flags(&self.oslibs))?;
        Ok(vars)
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn compile_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        options: &LocalOptions,
    ) -> Result<Bindings> {
        let mut vars = common_compile_bindings(self, config, arch, kind, options)?;
        if let Some(paths) = &self.android {
            vars.bind("sysroot", paths.sysroot(arch)?)?;
        }
        Ok(vars)
    }

    fn archive_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        _options: &LocalOptions,
    ) -> Result<Bindings> {
        let mut vars = common_archive_bindings(self, config, arch, kind)?;
        if let Some(paths) = &self.android {
            vars.bind("toolchain", paths.gcc_bin_prefix(arch)?)?;
        }
        Ok(vars)
    }

    fn link_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        options: &LocalOptions,
        output: &str,
    ) -> Result<Bindings> {
        let mut vars =
            common_link_bindings(self, config, arch, kind, options, |f| self.forward(f))?;
        vars.bind_flags("archlibs", self.arch_libraries(arch))?;
        if let Some(paths) = &self.android {
            vars.bind("sysroot", paths.sysroot(arch)?)?;
            let soname = Path::new(output)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| output.to_string());
            vars.bind("liblinkname", soname)?;
        }
        Ok(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolchainError;
    use crate::flags::DYNAMIC_LINK_DEFINE;
    use crate::host::HostInfo;
    use crate::prefs::AndroidPrefs;

    fn linux_host() -> HostInfo {
        HostInfo::new(Platform::Linux, true)
    }

    fn desktop(target: Platform) -> ClangToolchain {
        let ctx = ToolchainContext::new("foundation", linux_host(), target);
        ClangToolchain::with_android_roots(ctx, &Preferences::default(), empty_roots()).unwrap()
    }

    fn empty_roots() -> AndroidRoots {
        AndroidRoots {
            ndk: String::new(),
            sdk: String::new(),
            platform_version: android::DEFAULT_PLATFORM_VERSION.into(),
        }
    }

    fn android_with_ndk() -> ClangToolchain {
        let ctx = ToolchainContext::new("foundation", linux_host(), Platform::Android);
        let prefs = Preferences {
            android: AndroidPrefs {
                ndkpath: Some("/ndk".into()),
                ..AndroidPrefs::default()
            },
            ..Preferences::default()
        };
        ClangToolchain::with_android_roots(ctx, &prefs, empty_roots()).unwrap()
    }

    #[test]
    fn base_flags_carry_project_define() {
        let tc = desktop(Platform::Linux);
        assert_eq!(tc.cflags().tokens()[0], "-std=c11");
        assert!(tc.cflags().contains("-DFOUNDATION_COMPILE=1"));
        assert!(!tc.cflags().contains("-DBUILD_MONOLITHIC=1"));
        assert!(base_cflags("my-lib", true).contains("-DMY_LIB_COMPILE=1"));
        assert!(base_cflags("x", true).contains("-DBUILD_MONOLITHIC=1"));
    }

    #[test]
    fn android_triples_for_every_architecture() {
        let tc = android_with_ndk();
        let expected = [
            (Architecture::X86, "i686-none-linux-android"),
            (Architecture::X86_64, "x86_64-none-linux-android"),
            (Architecture::Arm6, "armv5te-none-linux-androideabi"),
            (Architecture::Arm7, "armv7-none-linux-androideabi"),
            (Architecture::Arm64, "aarch64-none-linux-android"),
            (Architecture::Mips, "mipsel-none-linux-android"),
            (Architecture::Mips64, "mips64el-none-linux-android"),
        ];
        for (arch, triple) in expected {
            let flags = tc.arch_compile_flags(arch, ArtifactKind::Object).unwrap();
            assert_eq!(&flags.tokens()[..2], ["-target", triple], "{arch}");
            let has_gcc = flags.contains("-gcc-toolchain");
            assert_eq!(has_gcc, matches!(arch, Architecture::Mips | Architecture::Mips64));
        }
    }

    #[test]
    fn mips_points_at_gcc_toolchain() {
        let tc = android_with_ndk();
        let flags = tc
            .arch_compile_flags(Architecture::Mips64, ArtifactKind::Object)
            .unwrap();
        assert_eq!(
            flags.tokens()[3],
            "/ndk/toolchains/mips64el-linux-android-4.9/prebuilt/linux-x86_64"
        );
    }

    #[test]
    fn composition_is_idempotent() {
        let tc = android_with_ndk();
        for arch in Architecture::ALL {
            for config in BuildConfig::ALL {
                for kind in ArtifactKind::ALL {
                    let a = tc.compile_flags(arch, config, kind).unwrap();
                    let b = tc.compile_flags(arch, config, kind).unwrap();
                    assert_eq!(a, b);
                    assert_eq!(
                        tc.link_flags(arch, config, kind).unwrap(),
                        tc.link_flags(arch, config, kind).unwrap()
                    );
                }
            }
        }
    }

    #[test]
    fn compile_flag_precedence() {
        let tc = android_with_ndk();
        let flags = tc
            .compile_flags(Architecture::Arm7, BuildConfig::Release, ArtifactKind::SharedLib)
            .unwrap();
        assert_eq!(
            flags.tokens(),
            [
                "-target",
                "armv7-none-linux-androideabi",
                "-DBUILD_RELEASE=1",
                "-O3",
                "-g",
                "-funroll-loops",
                DYNAMIC_LINK_DEFINE,
            ]
        );
    }

    #[test]
    fn dynamic_link_define_only_for_shared_libraries() {
        let tc = desktop(Platform::Linux);
        for kind in ArtifactKind::ALL {
            let flags = tc
                .compile_flags(Architecture::X86_64, BuildConfig::Debug, kind)
                .unwrap();
            assert_eq!(
                flags.contains(DYNAMIC_LINK_DEFINE),
                kind.base() == ArtifactKind::SharedLib,
                "{kind}"
            );
        }
    }

    #[test]
    fn windows_extension() {
        let tc = desktop(Platform::Windows);
        assert!(tc.cflags().contains("-U__STRICT_ANSI__"));
        let vars = tc.variables().unwrap();
        assert_eq!(
            vars.get("oslibs").unwrap().render(),
            "-lkernel32 -luser32 -lshell32 -ladvapi32"
        );
        assert_eq!(
            tc.config_link_flags(BuildConfig::Debug, ArtifactKind::SharedLib)
                .tokens(),
            ["-Xlinker", "/DLL"]
        );
        assert_eq!(
            tc.config_link_flags(BuildConfig::Debug, ArtifactKind::MultiExecutable)
                .tokens(),
            ["-Xlinker", "/SUBSYSTEM:CONSOLE"]
        );
        assert!(tc
            .config_link_flags(BuildConfig::Debug, ArtifactKind::StaticLib)
            .is_empty());
    }

    #[test]
    fn windows_library_paths_are_forwarded() {
        let ctx = ToolchainContext::new("foundation", linux_host(), Platform::Windows)
            .with_lib_paths(vec!["A".into(), "B".into()]);
        let tc = ClangToolchain::with_android_roots(ctx, &Preferences::default(), empty_roots())
            .unwrap();
        let vars = tc.variables().unwrap();
        assert_eq!(
            vars.get("libpaths").unwrap().render(),
            "-Xlinker /LIBPATH:A -Xlinker /LIBPATH:B"
        );
    }

    #[test]
    fn android_extension_rewrites_commands() {
        let tc = android_with_ndk();
        let cc = tc.rules().iter().find(|r| r.name == "cc").unwrap();
        assert!(cc.command.ends_with(" --sysroot=$sysroot"));
        let so = tc.rules().iter().find(|r| r.name == "so").unwrap();
        assert!(so
            .command
            .ends_with(" -shared -Wl,-soname,$liblinkname --sysroot=$sysroot"));
        assert!(tc.cflags().contains("-fstack-protector"));
        assert_eq!(tc.linkflags().tokens().last().unwrap(), "-Wl,-z,now");
        assert_eq!(
            tc.toolchain_root(),
            "/ndk/toolchains/llvm/prebuilt/linux-x86_64/bin/"
        );
        let vars = tc.variables().unwrap();
        assert_eq!(vars.get("ar").unwrap().render(), "ar");
        assert_eq!(vars.get("oslibs").unwrap().render(), "-llog");
        assert!(vars
            .get("includepaths")
            .unwrap()
            .render()
            .contains("-I$ndk/sources/android/native_app_glue"));
    }

    #[test]
    fn android_arch_libraries() {
        let tc = android_with_ndk();
        assert_eq!(
            tc.arch_libraries(Architecture::Arm7).tokens(),
            ["-lm_hard", "-lgcc", "-landroid"]
        );
        assert_eq!(
            tc.arch_libraries(Architecture::X86).tokens(),
            ["-lm", "-lgcc", "-landroid"]
        );
        assert!(desktop(Platform::Linux)
            .arch_libraries(Architecture::X86_64)
            .is_empty());
    }

    #[test]
    fn desktop_shared_objects_link_with_shared() {
        let tc = desktop(Platform::Linux);
        let so = tc.rules().iter().find(|r| r.name == "so").unwrap();
        let link = tc.rules().iter().find(|r| r.name == "link").unwrap();
        assert!(so.command.ends_with(" -shared"));
        assert!(!link.command.contains("-shared"));
    }

    #[test]
    fn toolchain_preference_gets_trailing_separator() {
        let ctx = ToolchainContext::new("foundation", linux_host(), Platform::Linux);
        let prefs = Preferences::from_json_str(r#"{"clang": {"toolchain": "/opt/llvm/bin"}}"#)
            .unwrap();
        let tc = ClangToolchain::with_android_roots(ctx, &prefs, empty_roots()).unwrap();
        assert_eq!(tc.toolchain_root(), "/opt/llvm/bin/");
        assert_eq!(desktop(Platform::Linux).toolchain_root(), "");
    }

    #[test]
    fn unset_ndk_fails_at_emission() {
        let ctx = ToolchainContext::new("foundation", linux_host(), Platform::Android);
        let tc = ClangToolchain::with_android_roots(ctx, &Preferences::default(), empty_roots())
            .unwrap();
        let err = tc
            .compile_variables(
                BuildConfig::Debug,
                Architecture::Arm7,
                ArtifactKind::Object,
                &LocalOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ToolchainError::MissingPreference {
                key: "android.ndkpath",
                ..
            }
        ));
    }

    #[test]
    fn empty_architecture_list_is_rejected() {
        let ctx = ToolchainContext::new("foundation", linux_host(), Platform::Linux)
            .with_archs(Vec::new());
        assert!(
            ClangToolchain::with_android_roots(ctx, &Preferences::default(), empty_roots())
                .is_err()
        );
    }
}
