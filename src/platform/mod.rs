//! Host platform detection and per-platform build targets.

mod targets;

pub use targets::{ArchiveKind, ArchiveSpec, BuildTarget, DESKTOP_ARGS, WEB_SERVER_ARGS};

use std::fmt;

use crate::error::{BisectError, Result};

/// Operating system and CPU architecture a build is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOsX64,
    MacOsArm64,
    LinuxX64,
    LinuxArm64,
    WindowsX64,
    WindowsArm64,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::MacOsX64,
        Platform::MacOsArm64,
        Platform::LinuxX64,
        Platform::LinuxArm64,
        Platform::WindowsX64,
        Platform::WindowsArm64,
    ];

    /// Detect the host platform
    pub fn current() -> Result<Self> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map `std::env::consts` style names to a platform
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self> {
        match (os, arch) {
            ("macos", "x86_64") => Ok(Platform::MacOsX64),
            ("macos", "aarch64") => Ok(Platform::MacOsArm64),
            ("linux", "x86_64") => Ok(Platform::LinuxX64),
            ("linux", "aarch64") => Ok(Platform::LinuxArm64),
            ("windows", "x86_64") => Ok(Platform::WindowsX64),
            ("windows", "aarch64") => Ok(Platform::WindowsArm64),
            _ => Err(BisectError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::WindowsX64 | Platform::WindowsArm64)
    }

    pub fn is_macos(&self) -> bool {
        matches!(self, Platform::MacOsX64 | Platform::MacOsArm64)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::MacOsX64 => "darwin-x64",
            Platform::MacOsArm64 => "darwin-arm64",
            Platform::LinuxX64 => "linux-x64",
            Platform::LinuxArm64 => "linux-arm64",
            Platform::WindowsX64 => "win32-x64",
            Platform::WindowsArm64 => "win32-arm64",
        };
        f.write_str(s)
    }
}
