//! Build target table keyed by (runtime, platform).
//!
//! Every combination resolves through one exhaustive `match`, so adding a
//! runtime or platform without a table entry fails to compile.

use super::Platform;
use crate::domain::Runtime;

/// Archive container format of a downloaded build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "archive.zip",
            ArchiveKind::TarGz => "archive.tar.gz",
        }
    }
}

/// What to download for a target and where the executable lands after extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSpec {
    /// Platform segment of the download URL
    pub download_platform: &'static str,
    pub kind: ArchiveKind,
    /// Executable path relative to the extraction directory
    pub executable: &'static str,
}

/// Everything needed to fetch, install and start one (runtime, platform) combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget {
    /// Platform segment of the commit catalog URL
    pub catalog_platform: &'static str,
    /// None for builds that are not installed locally
    pub archive: Option<ArchiveSpec>,
    /// Static launch arguments (directory arguments are added by the launcher)
    pub args: &'static [&'static str],
    /// Use a shortened commit prefix for install directories
    pub short_paths: bool,
}

/// Web server flags; telemetry, workspace trust and update checks are disabled
pub const WEB_SERVER_ARGS: &[&str] = &[
    "--accept-server-license-terms",
    "--disable-telemetry",
    "--disable-workspace-trust",
    "--disable-updates",
];

/// Desktop flags; telemetry, workspace trust and update checks are disabled
pub const DESKTOP_ARGS: &[&str] = &[
    "--skip-release-notes",
    "--skip-welcome",
    "--disable-telemetry",
    "--disable-workspace-trust",
    "--disable-updates",
];

const fn web(download_platform: &'static str, kind: ArchiveKind, executable: &'static str, short_paths: bool) -> BuildTarget {
    BuildTarget {
        catalog_platform: download_platform,
        archive: Some(ArchiveSpec {
            download_platform,
            kind,
            executable,
        }),
        args: WEB_SERVER_ARGS,
        short_paths,
    }
}

const fn desktop(download_platform: &'static str, kind: ArchiveKind, executable: &'static str, short_paths: bool) -> BuildTarget {
    BuildTarget {
        catalog_platform: download_platform,
        archive: Some(ArchiveSpec {
            download_platform,
            kind,
            executable,
        }),
        args: DESKTOP_ARGS,
        short_paths,
    }
}

static WEB_DARWIN_X64: BuildTarget = web(
    "server-darwin-web",
    ArchiveKind::Zip,
    "vscode-server-darwin-x64-web/bin/code-server-insiders",
    false,
);
static WEB_DARWIN_ARM64: BuildTarget = web(
    "server-darwin-arm64-web",
    ArchiveKind::Zip,
    "vscode-server-darwin-arm64-web/bin/code-server-insiders",
    false,
);
static WEB_LINUX_X64: BuildTarget = web(
    "server-linux-x64-web",
    ArchiveKind::TarGz,
    "vscode-server-linux-x64-web/bin/code-server-insiders",
    false,
);
static WEB_LINUX_ARM64: BuildTarget = web(
    "server-linux-arm64-web",
    ArchiveKind::TarGz,
    "vscode-server-linux-arm64-web/bin/code-server-insiders",
    false,
);
static WEB_WIN32_X64: BuildTarget = web(
    "server-win32-x64-web",
    ArchiveKind::Zip,
    "vscode-server-win32-x64-web/bin/code-server-insiders.cmd",
    true,
);
static WEB_WIN32_ARM64: BuildTarget = web(
    "server-win32-arm64-web",
    ArchiveKind::Zip,
    "vscode-server-win32-arm64-web/bin/code-server-insiders.cmd",
    true,
);

static DESKTOP_DARWIN_X64: BuildTarget = desktop(
    "darwin",
    ArchiveKind::Zip,
    "Visual Studio Code - Insiders.app/Contents/MacOS/Electron",
    false,
);
static DESKTOP_DARWIN_ARM64: BuildTarget = desktop(
    "darwin-arm64",
    ArchiveKind::Zip,
    "Visual Studio Code - Insiders.app/Contents/MacOS/Electron",
    false,
);
static DESKTOP_LINUX_X64: BuildTarget = desktop(
    "linux-x64",
    ArchiveKind::TarGz,
    "VSCode-linux-x64/code-insiders",
    false,
);
static DESKTOP_LINUX_ARM64: BuildTarget = desktop(
    "linux-arm64",
    ArchiveKind::TarGz,
    "VSCode-linux-arm64/code-insiders",
    false,
);
static DESKTOP_WIN32_X64: BuildTarget = desktop(
    "win32-x64-archive",
    ArchiveKind::Zip,
    "Code - Insiders.exe",
    true,
);
static DESKTOP_WIN32_ARM64: BuildTarget = desktop(
    "win32-arm64-archive",
    ArchiveKind::Zip,
    "Code - Insiders.exe",
    true,
);

// Hosted builds are served from the linux web server build stream
static REMOTE: BuildTarget = BuildTarget {
    catalog_platform: "server-linux-x64-web",
    archive: None,
    args: &[],
    short_paths: false,
};

impl BuildTarget {
    /// Look up the target for a runtime on a platform
    pub fn resolve(runtime: Runtime, platform: Platform) -> &'static BuildTarget {
        match (runtime, platform) {
            (Runtime::WebLocal, Platform::MacOsX64) => &WEB_DARWIN_X64,
            (Runtime::WebLocal, Platform::MacOsArm64) => &WEB_DARWIN_ARM64,
            (Runtime::WebLocal, Platform::LinuxX64) => &WEB_LINUX_X64,
            (Runtime::WebLocal, Platform::LinuxArm64) => &WEB_LINUX_ARM64,
            (Runtime::WebLocal, Platform::WindowsX64) => &WEB_WIN32_X64,
            (Runtime::WebLocal, Platform::WindowsArm64) => &WEB_WIN32_ARM64,
            (Runtime::DesktopLocal, Platform::MacOsX64) => &DESKTOP_DARWIN_X64,
            (Runtime::DesktopLocal, Platform::MacOsArm64) => &DESKTOP_DARWIN_ARM64,
            (Runtime::DesktopLocal, Platform::LinuxX64) => &DESKTOP_LINUX_X64,
            (Runtime::DesktopLocal, Platform::LinuxArm64) => &DESKTOP_LINUX_ARM64,
            (Runtime::DesktopLocal, Platform::WindowsX64) => &DESKTOP_WIN32_X64,
            (Runtime::DesktopLocal, Platform::WindowsArm64) => &DESKTOP_WIN32_ARM64,
            (Runtime::WebRemote, _) => &REMOTE,
        }
    }
}
