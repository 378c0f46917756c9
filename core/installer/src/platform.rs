//! Host platform resolution.
//!
//! Maps the running OS, CPU architecture and word size to the suffix the
//! catalog uses in artifact file names.
//!
//! ## Supported Platforms
//!
//! - Windows x86 (`win32`)
//! - Windows `x86_64` (`win64`, or `win32` for a 32-bit process)
//! - Linux `x86_64` (`ubuntu22_x86_64`)
//! - Linux ARM hard-float (`raspbian_armhf`)
//!
//! Windows on ARM and macOS have no SDK build and are rejected.

use std::fmt;

use crate::error::SdkError;

/// Facts about a host that decide which SDK build applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    /// OS name as reported by `std::env::consts::OS`.
    pub os: &'static str,
    /// Architecture name as reported by `std::env::consts::ARCH`.
    pub arch: &'static str,
    /// Pointer width of the running process.
    pub bits: u32,
}

impl Host {
    /// Describes the host this binary runs on.
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            bits: usize::BITS,
        }
    }
}

/// Catalog build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformTarget {
    /// 32-bit Windows.
    Win32,
    /// 64-bit Windows.
    Win64,
    /// Linux on `x86_64`.
    LinuxX86_64,
    /// Linux on 32-bit ARM hard-float.
    LinuxArmhf,
}

impl PlatformTarget {
    /// Resolves the target for the running host.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::UnsupportedPlatform`] if no SDK build exists for the host.
    pub fn resolve() -> Result<Self, SdkError> {
        Self::resolve_for(Host::current())
    }

    /// Resolves the target for the given host.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::UnsupportedPlatform`] if no SDK build exists for `host`.
    pub fn resolve_for(host: Host) -> Result<Self, SdkError> {
        let target = match (host.os, host.arch) {
            ("windows", "x86") => Some(Self::Win32),
            ("windows", "x86_64") if host.bits >= 64 => Some(Self::Win64),
            ("windows", "x86_64") => Some(Self::Win32),
            ("linux", "x86_64") => Some(Self::LinuxX86_64),
            ("linux", "arm") => Some(Self::LinuxArmhf),
            _ => None,
        };

        target.ok_or_else(|| SdkError::UnsupportedPlatform {
            os: host.os.to_string(),
            arch: host.arch.to_string(),
            bits: host.bits,
        })
    }

    /// Suffix used in catalog artifact names.
    #[must_use = "returns the suffix without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Win64 => "win64",
            Self::LinuxX86_64 => "ubuntu22_x86_64",
            Self::LinuxArmhf => "raspbian_armhf",
        }
    }

    #[must_use = "returns platform check result without side effects"]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Win32 | Self::Win64)
    }

    /// File name of the native library the runtime loads on this target.
    #[must_use = "returns the library name without side effects"]
    pub fn native_library(self) -> &'static str {
        if self.is_windows() {
            "TeamTalk5.dll"
        } else {
            "libTeamTalk5.so"
        }
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
