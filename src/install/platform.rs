//! Host platform and Linux distribution detection

use std::fmt;
use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;

use crate::error::{InstallerError, Result};

/// Operating systems the installer knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
}

/// Global cache for platform detection (initialized once, used everywhere)
static PLATFORM_CACHE: OnceCell<Platform> = OnceCell::new();

impl Platform {
    /// Detect current platform (cached after first call)
    pub fn detect() -> Result<Self> {
        PLATFORM_CACHE
            .get_or_try_init(|| Self::from_os(std::env::consts::OS))
            .copied()
    }

    /// Map a Rust target OS name onto a supported platform
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::Darwin),
            "windows" => Ok(Platform::Windows),
            other => Err(InstallerError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }

    pub fn is_linux(self) -> bool {
        self == Platform::Linux
    }

    pub fn is_darwin(self) -> bool {
        self == Platform::Darwin
    }

    /// Interpreter used when no `--python-path` is given
    pub fn default_python_path(self) -> &'static str {
        match self {
            Platform::Windows => "c:/python27/python.exe",
            Platform::Linux | Platform::Darwin => "python",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Windows => "win32",
        })
    }
}

/// Platform plus distribution identity (lowercased)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    pub platform: Platform,
    pub distro: String,
    pub release: String,
}

impl OsInfo {
    pub fn new(platform: Platform, distro: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            platform,
            distro: distro.into().to_lowercase(),
            release: release.into().to_lowercase(),
        }
    }

    /// Detect the running host; distribution fields stay empty off Linux
    pub fn detect() -> Result<Self> {
        let platform = Platform::detect()?;
        if !platform.is_linux() {
            return Ok(Self::new(platform, "", ""));
        }

        let (distro, release) = fs::read_to_string("/etc/os-release")
            .or_else(|_| fs::read_to_string("/usr/lib/os-release"))
            .map(|contents| parse_os_release(&contents))
            .unwrap_or_default();
        Ok(Self::new(platform, distro, release))
    }
}

/// Extract `ID` and `VERSION_ID` from os-release(5) contents
pub fn parse_os_release(contents: &str) -> (String, String) {
    let mut id = String::new();
    let mut version = String::new();

    for line in contents.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        match key.trim() {
            "ID" => id = value.to_string(),
            "VERSION_ID" => version = value.to_string(),
            _ => {}
        }
    }

    (id, version)
}

/// Arch Linux ships no os-release ID on older installs, only this marker
pub fn is_arch() -> bool {
    Path::new("/etc/arch-release").is_file()
}
