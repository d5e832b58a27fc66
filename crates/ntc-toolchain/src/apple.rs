//! Apple SDK resolution through the SDK locator.

use ntc_targets::{Architecture, Platform};

use crate::error::{Result, ToolchainError};
use crate::locator::ToolLocator;

/// Developer and system directories searched after the SDK platform's own
/// `Developer/usr/bin`.
const SEARCH_PATH_TAIL: &str =
    "/Applications/Xcode.app/Contents/Developer/usr/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// Default minimum macOS version.
pub const DEFAULT_MACOSX_DEPLOYMENT_TARGET: &str = "10.7";

/// Default minimum iOS version.
pub const DEFAULT_IOS_DEPLOYMENT_TARGET: &str = "8.0";

/// `-arch` name for an Apple target. Only x86, x86-64, arm7 and arm64
/// exist on Apple platforms.
pub fn arch_name(arch: Architecture) -> Result<&'static str> {
    match arch {
        Architecture::X86 => Ok("i386"),
        Architecture::X86_64 => Ok("x86_64"),
        Architecture::Arm7 => Ok("armv7"),
        Architecture::Arm64 => Ok("arm64"),
        arch => Err(ToolchainError::MissingLookupEntry {
            table: "apple architecture",
            arch,
        }),
    }
}

/// SDK name, version-min flag stem and deployment variable for a target.
pub(crate) fn sdk_for(target: Platform) -> Result<(&'static str, &'static str, &'static str)> {
    match target {
        Platform::MacOsx => Ok(("macosx", "macosx", "MACOSX_DEPLOYMENT_TARGET")),
        Platform::Ios => Ok(("iphoneos", "iphoneos", "IPHONEOS_DEPLOYMENT_TARGET")),
        platform => Err(ToolchainError::UnsupportedPlatform {
            backend: "xcode",
            platform,
        }),
    }
}

/// Resolved Apple developer tool locations.
///
/// Tool fields are complete command prefixes: an environment binding of
/// `PATH` (or the deployment target for the linker) followed by the absolute
/// tool path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplePaths {
    /// SDK name passed to the locator (`macosx` or `iphoneos`).
    pub sdk: &'static str,
    /// Stem of the `-m<stem>-version-min=` flag.
    pub version_min_stem: &'static str,
    pub deployment_target: String,
    pub platform_path: String,
    pub sdk_path: String,
    /// `PATH` value under which every tool runs.
    pub local_path: String,
    pub cc: String,
    pub ar: String,
    pub link: String,
    pub lipo: String,
    pub plist: String,
    pub xcassets: String,
    pub xib: String,
    pub dsymutil: String,
}

impl ApplePaths {
    /// Query `locator` for every tool. Any failed query aborts resolution.
    pub fn resolve(
        target: Platform,
        deployment_target: &str,
        locator: &dyn ToolLocator,
    ) -> Result<Self> {
        let (sdk, version_min_stem, deploy_var) = sdk_for(target)?;

        let platform_path = locator.platform_path(sdk)?;
        let sdk_path = locator.sdk_path(sdk)?;
        let local_path = format!("{platform_path}/Developer/usr/bin:{SEARCH_PATH_TAIL}");

        let tool = |name: &str| -> Result<String> {
            Ok(format!("PATH={local_path} {}", locator.find_tool(sdk, name)?))
        };

        let cc = tool("clang")?;
        let link = format!("{deploy_var}={deployment_target} {cc}");
        let paths = Self {
            sdk,
            version_min_stem,
            deployment_target: deployment_target.into(),
            ar: tool("libtool")?,
            lipo: tool("lipo")?,
            plist: tool("plutil")?,
            xcassets: tool("actool")?,
            xib: tool("ibtool")?,
            dsymutil: tool("dsymutil")?,
            cc,
            link,
            platform_path,
            sdk_path,
            local_path,
        };
        tracing::debug!(sdk, sdk_path = %paths.sdk_path, "resolved apple sdk");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::fixed::FixedLocator;

    #[test]
    fn resolves_macosx_tools() {
        let locator = FixedLocator::for_sdk("macosx");
        let paths = ApplePaths::resolve(Platform::MacOsx, "10.12", &locator).unwrap();
        assert_eq!(paths.sdk, "macosx");
        assert!(paths
            .local_path
            .starts_with("/Xcode/Platforms/macosx.platform/Developer/usr/bin:"));
        assert!(paths.cc.starts_with("PATH=/Xcode/Platforms/macosx.platform"));
        assert!(paths.cc.ends_with(" /Xcode/usr/bin/clang"));
        assert!(paths.ar.ends_with(" /Xcode/usr/bin/libtool"));
        assert!(paths
            .link
            .starts_with("MACOSX_DEPLOYMENT_TARGET=10.12 PATH="));
        assert!(paths.dsymutil.ends_with("dsymutil"));
    }

    #[test]
    fn ios_uses_iphoneos_sdk() {
        let locator = FixedLocator::for_sdk("iphoneos");
        let paths = ApplePaths::resolve(Platform::Ios, "9.0", &locator).unwrap();
        assert_eq!(paths.version_min_stem, "iphoneos");
        assert!(paths.link.starts_with("IPHONEOS_DEPLOYMENT_TARGET=9.0 "));
    }

    #[test]
    fn locator_failure_is_fatal() {
        let locator = FixedLocator::for_sdk("macosx").without("macosx -f lipo");
        let err = ApplePaths::resolve(Platform::MacOsx, "10.7", &locator).unwrap_err();
        assert!(matches!(err, ToolchainError::Discovery { .. }));
    }

    #[test]
    fn non_apple_target_rejected() {
        let locator = FixedLocator::for_sdk("macosx");
        let err = ApplePaths::resolve(Platform::Linux, "10.7", &locator).unwrap_err();
        assert!(matches!(err, ToolchainError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn arch_table_is_partial() {
        assert_eq!(arch_name(Architecture::X86).unwrap(), "i386");
        assert_eq!(arch_name(Architecture::Arm64).unwrap(), "arm64");
        for arch in [Architecture::Arm6, Architecture::Mips, Architecture::Mips64] {
            assert!(matches!(
                arch_name(arch),
                Err(ToolchainError::MissingLookupEntry { .. })
            ));
        }
    }
}
