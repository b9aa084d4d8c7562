//! Supported host platforms and architectures.
//!
//! Tokens follow the naming used in package filenames and patch suffixes
//! (`darwin`, `linux`, `win32`; `x64`, `arm64`, `x86`).

use std::fmt;

/// Operating platforms the acquisition pipeline knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Apple macOS.
    MacOs,
    /// Linux distributions.
    Linux,
    /// Microsoft Windows.
    Windows,
}

impl Platform {
    /// Detect the platform of the running process.
    ///
    /// Returns `None` for anything outside the three supported platforms;
    /// callers treat that as "nothing to acquire".
    #[must_use]
    pub fn current() -> Option<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a Rust `target_os` name onto a supported platform.
    #[must_use]
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "macos" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    /// The token used in package filenames and patch suffixes.
    ///
    /// # Examples
    ///
    /// ```
    /// use openssl_acquire::platform::Platform;
    ///
    /// assert_eq!(Platform::MacOs.token(), "darwin");
    /// assert_eq!(Platform::Windows.token(), "win32");
    /// ```
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::MacOs => "darwin",
            Self::Linux => "linux",
            Self::Windows => "win32",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// CPU architectures with a known OpenSSL configure target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86.
    X64,
    /// 64-bit ARM.
    Arm64,
    /// 32-bit x86.
    X86,
}

impl Arch {
    /// Detect the architecture of the running process.
    #[must_use]
    pub fn current() -> Option<Self> {
        Self::from_rust_arch(std::env::consts::ARCH)
    }

    /// Map a Rust `target_arch` name onto a known architecture.
    #[must_use]
    pub fn from_rust_arch(arch: &str) -> Option<Self> {
        match arch {
            "x86_64" => Some(Self::X64),
            "aarch64" => Some(Self::Arm64),
            "x86" => Some(Self::X86),
            _ => None,
        }
    }

    /// The token used in package filenames.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
