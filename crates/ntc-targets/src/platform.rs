//! Host and target operating system classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// An operating system a toolchain runs on (host) or builds for (target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    MacOsx,
    Ios,
    Android,
    /// Raspbian on Raspberry Pi boards.
    RaspberryPi,
    Bsd,
}

impl Platform {
    /// Every known platform.
    pub const ALL: [Platform; 7] = [
        Platform::Windows,
        Platform::Linux,
        Platform::MacOsx,
        Platform::Ios,
        Platform::Android,
        Platform::RaspberryPi,
        Platform::Bsd,
    ];

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOsx
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            Platform::Bsd
        } else {
            Platform::Linux
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }

    pub fn is_linux(self) -> bool {
        self == Platform::Linux
    }

    pub fn is_macosx(self) -> bool {
        self == Platform::MacOsx
    }

    pub fn is_ios(self) -> bool {
        self == Platform::Ios
    }

    pub fn is_android(self) -> bool {
        self == Platform::Android
    }

    pub fn is_raspberrypi(self) -> bool {
        self == Platform::RaspberryPi
    }

    pub fn is_bsd(self) -> bool {
        self == Platform::Bsd
    }

    /// macOS or iOS.
    pub fn is_apple(self) -> bool {
        self.is_macosx() || self.is_ios()
    }

    /// Executable file suffix on this platform.
    pub fn exe_suffix(self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }

    /// Lowercase tag.
    pub fn tag(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOsx => "macosx",
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::RaspberryPi => "raspberrypi",
            Platform::Bsd => "bsd",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Platform {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        Platform::ALL
            .into_iter()
            .find(|p| p.tag() == s)
            .ok_or_else(|| TargetError::UnknownPlatform { tag: s.into() })
    }
}
