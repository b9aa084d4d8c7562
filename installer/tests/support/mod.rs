//! Test support utilities for the behaviour suites.

use openssl_acquire::platform::{Arch, Platform};

/// Parse a platform token as used in feature files (`darwin`, `linux`, `win32`).
pub fn platform_from_token(token: &str) -> Platform {
    match token {
        "darwin" => Platform::MacOs,
        "linux" => Platform::Linux,
        "win32" => Platform::Windows,
        other => panic!("unknown platform token {other}"),
    }
}

/// Parse an architecture token as used in feature files (`x64`, `arm64`, `x86`).
pub fn arch_from_token(token: &str) -> Arch {
    match token {
        "x64" => Arch::X64,
        "arm64" => Arch::Arm64,
        "x86" => Arch::X86,
        other => panic!("unknown arch token {other}"),
    }
}
