//! Xcode toolchain for macOS and iOS targets.

use std::path::Path;

use ntc_targets::{Architecture, ArtifactKind, BuildConfig, Platform};

use crate::apple::{self, ApplePaths};
use crate::clang::base_cflags;
use crate::error::Result;
use crate::flags::{
    self, framework_flags, include_path_flags, library_path_flags, FlagComposer, FlagSet,
};
use crate::lifecycle::{Lifecycle, Stage};
use crate::locator::ToolLocator;
use crate::prefs::{override_with, ApplePrefs, Preferences};
use crate::toolchain::{
    common_archive_bindings, common_compile_bindings, common_link_bindings, require_archs,
    LocalOptions, Toolchain, ToolchainContext,
};
use crate::writer::{Bindings, BuildStatement, Rule};

/// Xcode backend. Every tool is resolved through the SDK locator at
/// construction.
#[derive(Debug, Clone)]
pub struct XcodeToolchain {
    ctx: ToolchainContext,
    paths: ApplePaths,
    organisation: String,
    bundle_identifier: String,
    provisioning: String,
    cflags: FlagSet,
    mflags: FlagSet,
    arflags: FlagSet,
    linkflags: FlagSet,
    frameworks: Vec<&'static str>,
    rules: Vec<Rule>,
}

impl XcodeToolchain {
    pub fn new(
        ctx: ToolchainContext,
        prefs: &Preferences,
        locator: &dyn ToolLocator,
    ) -> Result<Self> {
        let (_, version_min_stem, _) = apple::sdk_for(ctx.target)?;
        require_archs(&ctx)?;
        let mut lifecycle = Lifecycle::new("xcode");

        let (target_prefs, default_target) = match ctx.target {
            Platform::Ios => (&prefs.ios, apple::DEFAULT_IOS_DEPLOYMENT_TARGET),
            _ => (&prefs.macosx, apple::DEFAULT_MACOSX_DEPLOYMENT_TARGET),
        };
        let ApplePrefs {
            deploymenttarget,
            organisation: org_pref,
            bundleidentifier,
            provisioning: prov_pref,
        } = target_prefs;
        let mut deployment_target = default_target.to_string();
        override_with(&mut deployment_target, deploymenttarget.as_ref());
        let mut organisation = String::new();
        override_with(&mut organisation, org_pref.as_ref());
        let mut bundle_identifier = String::new();
        override_with(&mut bundle_identifier, bundleidentifier.as_ref());
        let mut provisioning = String::new();
        override_with(&mut provisioning, prov_pref.as_ref());

        let mut cflags = base_cflags(&ctx.project, ctx.monolithic);
        let mut arflags = FlagSet::new();
        let mut linkflags = FlagSet::new();
        lifecycle.advance(Stage::BaseFlagsSet)?;

        cflags.extend([
            "-fasm-blocks".to_string(),
            format!("-m{version_min_stem}-version-min={deployment_target}"),
            "-isysroot".to_string(),
            "$sdkpath".to_string(),
        ]);
        let mflags = cflags
            .clone()
            .then(["-fobjc-arc", "-fno-objc-exceptions", "-x", "objective-c"].into_iter().collect());
        cflags.extend(["-x", "c"]);
        arflags.extend(["-static", "-no_warning_for_no_symbols"]);
        linkflags.extend(["-isysroot", "$sdkpath"]);
        let frameworks = match ctx.target {
            Platform::Ios => vec!["Foundation", "UIKit"],
            _ => vec!["Foundation", "Cocoa"],
        };
        lifecycle.advance(Stage::PlatformExtended)?;

        let paths = ApplePaths::resolve(ctx.target, &deployment_target, locator)?;
        lifecycle.advance(Stage::PathsResolved)?;

        let rules = xcode_rules(&ctx, &paths);
        lifecycle.advance(Stage::RulesRegistered)?;

        let backend = Self {
            ctx,
            paths,
            organisation,
            bundle_identifier,
            provisioning,
            cflags,
            mflags,
            arflags,
            linkflags,
            frameworks,
            rules,
        };
        lifecycle.advance(Stage::Ready)?;
        Ok(backend)
    }

    pub fn paths(&self) -> &ApplePaths {
        &self.paths
    }

    pub fn cflags(&self) -> &FlagSet {
        &self.cflags
    }

    /// Objective-C compile flags.
    pub fn mflags(&self) -> &FlagSet {
        &self.mflags
    }

    fn arch_flags(&self, arch: Architecture) -> Result<FlagSet> {
        let mut flags = FlagSet::new();
        flags.push("-arch");
        flags.push(apple::arch_name(arch)?);
        Ok(flags)
    }
}

fn xcode_rules(ctx: &ToolchainContext, paths: &ApplePaths) -> Vec<Rule> {
    let rm = ctx.host.rm_command("$out");
    let compile = |flags: &str| {
        format!(
            "$cc -MMD -MT $out -MF $out.d -I. $includepaths $moreincludepaths {flags} \
             $carchflags $cconfigflags $ckindflags -c $in -o $out"
        )
    };
    let link_inputs = "$libpaths $configlibpaths $linkflags $linkarchflags $linkconfigflags \
                       $in $libs $archlibs $oslibs -o $out";
    let (platform, devices) = match ctx.target {
        Platform::Ios => ("iphoneos", "--target-device iphone --target-device ipad"),
        _ => ("macosx", "--target-device mac"),
    };
    let dt = &paths.deployment_target;

    vec![
        Rule::new("cc", compile("$cflags"), "CC $in").with_depfile("$out.d", "gcc"),
        Rule::new("cm", compile("$mflags"), "CM $in").with_depfile("$out.d", "gcc"),
        Rule::new(
            "ar",
            format!("{rm} && $ar $ararchflags $arflags $arconfigflags $in -o $out"),
            "LIB $out",
        ),
        Rule::new("so", format!("$link -dynamiclib {link_inputs}"), "SO $out"),
        Rule::new("link", format!("$link {link_inputs}"), "LINK $out"),
        Rule::new("lipo", "$lipo -create $in -output $out", "LIPO $out"),
        Rule::new(
            "xcassets",
            format!(
                "mkdir -p $outpath && $xcassets --output-format human-readable-text \
                 --output-partial-info-plist $outplist --app-icon AppIcon \
                 --launch-image LaunchImage --platform {platform} \
                 --minimum-deployment-target {dt} {devices} --compress-pngs \
                 --compile $outpath $in"
            ),
            "XCASSETS $in",
        ),
        Rule::new(
            "xib",
            format!(
                "$xib {devices} --module $module --minimum-deployment-target {dt} \
                 --output-partial-info-plist $outplist --auto-activate-custom-fonts \
                 --output-format human-readable-text --compile $outpath $in"
            ),
            "XIB $in",
        ),
        Rule::new("dsymutil", "$dsymutil $in -o $outpath", "DSYMUTIL $outpath"),
    ]
}

impl FlagComposer for XcodeToolchain {
    fn arch_compile_flags(&self, arch: Architecture, _kind: ArtifactKind) -> Result<FlagSet> {
        self.arch_flags(arch)
    }

    fn config_compile_flags(&self, config: BuildConfig, _kind: ArtifactKind) -> FlagSet {
        flags::config_compile_flags(config)
    }

    fn arch_link_flags(&self, arch: Architecture, _kind: ArtifactKind) -> Result<FlagSet> {
        self.arch_flags(arch)
    }

    fn config_link_flags(&self, _config: BuildConfig, _kind: ArtifactKind) -> FlagSet {
        FlagSet::new()
    }
}

impl Toolchain for XcodeToolchain {
    fn name(&self) -> &'static str {
        "xcode"
    }

    fn context(&self) -> &ToolchainContext {
        &self.ctx
    }

    fn variables(&self) -> Result<Bindings> {
        let p = &self.paths;
        let mut vars = Bindings::new();
        vars.bind("sdkpath", p.sdk_path.as_str())?;
        vars.bind("cc", p.cc.as_str())?;
        vars.bind("ar", p.ar.as_str())?;
        vars.bind("link", p.link.as_str())?;
        vars.bind("lipo", p.lipo.as_str())?;
        vars.bind("plist", p.plist.as_str())?;
        vars.bind("xcassets", p.xcassets.as_str())?;
        vars.bind("xib", p.xib.as_str())?;
        vars.bind("dsymutil", p.dsymutil.as_str())?;
        vars.bind("deploymenttarget", p.deployment_target.as_str())?;
        vars.bind("organisation", self.organisation.as_str())?;
        vars.bind("bundleidentifier", self.bundle_identifier.as_str())?;
        vars.bind("provisioning", self.provisioning.as_str())?;
        vars.bind("includepaths", include_path_flags(&self.ctx.include_paths))?;
        vars.bind("moreincludepaths", "")?;
        vars.bind("cflags", self.cflags.clone())?;
        vars.bind("mflags", self.mflags.clone())?;
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
            library_path_flags(&self.ctx.lib_paths, self.ctx.target),
        )?;
        vars.bind("configlibpaths", "")?;
        vars.bind("archlibs", "")?;
        vars.bind("oslibs", framework_flags(&self.frameworks))?;
        Ok(vars)
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn compile_rule(&self, input: &str) -> &'static str {
        match Path::new(input).extension().and_then(|e| e.to_str()) {
            Some("m" | "mm") => "cm",
            _ => "cc",
        }
    }

    fn compile_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        options: &LocalOptions,
    ) -> Result<Bindings> {
        common_compile_bindings(self, config, arch, kind, options)
    }

    fn archive_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        _options: &LocalOptions,
    ) -> Result<Bindings> {
        common_archive_bindings(self, config, arch, kind)
    }

    fn link_variables(
        &self,
        config: BuildConfig,
        arch: Architecture,
        kind: ArtifactKind,
        options: &LocalOptions,
        _output: &str,
    ) -> Result<Bindings> {
        common_link_bindings(self, config, arch, kind, options, |f| f)
    }

    /// Universal binary from the per-architecture outputs.
    fn merge_statement(&self, outputs: &[String], merged: &str) -> Option<BuildStatement> {
        Some(BuildStatement {
            outputs: vec![merged.to_string()],
            rule: "lipo".into(),
            inputs: outputs.to_vec(),
            implicit: Vec::new(),
            variables: Bindings::new(),
        })
    }
}
