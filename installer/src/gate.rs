//! Version gate for an existing vendor directory.
//!
//! The gate decides whether acquisition can be skipped. It first asks the
//! installed `openssl` binary for its version and removes the vendor
//! directory when that version is not the desired one. It then treats the
//! mere existence of the vendor directory as "already acquired".
//!
//! The probe is lenient: a missing binary, a failing probe, or output that
//! does not parse are all treated as "nothing to remove". An existing vendor
//! directory with no usable binary is therefore skipped unchanged.

use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::platform::Platform;
use log::{debug, info};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Outcome of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The vendor directory is present; nothing to do.
    Skip,
    /// Acquisition should proceed.
    Proceed,
}

/// Path of the `openssl` binary inside an installed vendor tree.
#[must_use]
pub fn openssl_binary(vendor_dir: &Path, platform: Platform) -> PathBuf {
    let name = match platform {
        Platform::Windows => "openssl.exe",
        Platform::MacOs | Platform::Linux => "openssl",
    };
    vendor_dir.join("bin").join(name)
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^OpenSSL (\d+\.\d+\.\d+[a-z]*)").expect("version pattern is valid")
    })
}

/// Extract the version from `openssl version` output.
///
/// # Examples
///
/// ```
/// use openssl_acquire::gate::parse_version_output;
///
/// let out = "OpenSSL 1.1.1w  11 Sep 2023\n";
/// assert_eq!(parse_version_output(out), Some("1.1.1w"));
/// assert_eq!(parse_version_output("LibreSSL 3.3.6"), None);
/// ```
#[must_use]
pub fn parse_version_output(stdout: &str) -> Option<&str> {
    version_pattern()
        .captures(stdout.trim_start())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Ask the vendored binary for its version.
///
/// Returns `None` without spawning anything when the binary is absent, and
/// `None` when the probe fails or its output is not recognised.
pub fn installed_version(
    executor: &dyn CommandExecutor,
    vendor_dir: &Path,
    platform: Platform,
) -> Option<String> {
    let binary = openssl_binary(vendor_dir, platform);
    if !binary.is_file() {
        debug!("no binary at {}; version probe skipped", binary.display());
        return None;
    }

    let program = binary.to_string_lossy();
    let output = match executor.run(&program, &["version"], vendor_dir) {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            debug!("version probe exited with {:?}", output.status.code());
            return None;
        }
        Err(err) => {
            debug!("version probe failed: {err}");
            return None;
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = parse_version_output(&stdout).map(ToOwned::to_owned);
    if version.is_none() {
        debug!("unrecognised version output: {}", stdout.trim());
    }
    version
}

/// Delete `vendor_dir` when its binary reports a version other than `desired`.
///
/// Returns whether the directory was removed.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be removed.
pub fn remove_if_outdated(
    executor: &dyn CommandExecutor,
    vendor_dir: &Path,
    platform: Platform,
    desired: &str,
) -> Result<bool> {
    match installed_version(executor, vendor_dir, platform) {
        Some(found) if found != desired => {
            info!(
                "Installed OpenSSL {found} does not match {desired}; removing {}",
                vendor_dir.display()
            );
            std::fs::remove_dir_all(vendor_dir)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Run the gate: version probe first, then the existence check.
///
/// # Errors
///
/// Returns an I/O error if an outdated vendor directory cannot be removed.
pub fn check(
    executor: &dyn CommandExecutor,
    vendor_dir: &Path,
    platform: Platform,
    desired: &str,
) -> Result<GateDecision> {
    remove_if_outdated(executor, vendor_dir, platform, desired)?;
    if vendor_dir.exists() {
        info!(
            "{} already exists; skipping OpenSSL acquisition",
            vendor_dir.display()
        );
        return Ok(GateDecision::Skip);
    }
    Ok(GateDecision::Proceed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        ExpectedCall, RecordingExecutor, StubExecutor, failure_output, stdout_output,
    };
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("temp dir creation succeeds")
    }

    fn install_binary(vendor: &Path) -> PathBuf {
        let binary = openssl_binary(vendor, Platform::Linux);
        std::fs::create_dir_all(binary.parent().expect("bin dir")).expect("mkdir");
        std::fs::write(&binary, b"").expect("write binary");
        binary
    }

    #[rstest]
    #[case::plain("OpenSSL 3.0.15 3 Sep 2024 (Library: OpenSSL 3.0.15 3 Sep 2024)", Some("3.0.15"))]
    #[case::letter_suffix("OpenSSL 1.1.1w  11 Sep 2023", Some("1.1.1w"))]
    #[case::leading_whitespace("\n OpenSSL 1.0.2u  20 Dec 2019", Some("1.0.2u"))]
    #[case::libressl("LibreSSL 3.3.6", None)]
    #[case::garbage("command not found", None)]
    fn parses_version_output(#[case] output: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_version_output(output), expected);
    }

    #[rstest]
    fn missing_vendor_dir_proceeds_without_probe(temp_dir: TempDir) {
        let executor = RecordingExecutor::new();
        let vendor = temp_dir.path().join("vendor");

        let decision = check(&executor, &vendor, Platform::Linux, "3.0.15").expect("gate");

        assert_eq!(decision, GateDecision::Proceed);
        assert!(executor.calls().is_empty());
    }

    #[rstest]
    fn existing_dir_without_binary_skips_without_probe(temp_dir: TempDir) {
        let executor = RecordingExecutor::new();
        let vendor = temp_dir.path().join("vendor");
        std::fs::create_dir_all(vendor.join("include")).expect("mkdir");

        let decision = check(&executor, &vendor, Platform::Linux, "3.0.15").expect("gate");

        assert_eq!(decision, GateDecision::Skip);
        assert!(executor.calls().is_empty());
    }

    #[rstest]
    fn matching_version_is_kept_and_skipped(temp_dir: TempDir) {
        let vendor = temp_dir.path().join("vendor");
        let binary = install_binary(&vendor);
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            &binary.to_string_lossy(),
            &["version"],
            Ok(stdout_output("OpenSSL 3.0.15 3 Sep 2024\n")),
        )]);

        let decision = check(&executor, &vendor, Platform::Linux, "3.0.15").expect("gate");

        assert_eq!(decision, GateDecision::Skip);
        assert!(vendor.exists());
        executor.assert_finished();
    }

    #[rstest]
    fn different_version_removes_vendor_dir(temp_dir: TempDir) {
        let vendor = temp_dir.path().join("vendor");
        let binary = install_binary(&vendor);
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            &binary.to_string_lossy(),
            &["version"],
            Ok(stdout_output("OpenSSL 1.1.1w  11 Sep 2023\n")),
        )]);

        let decision = check(&executor, &vendor, Platform::Linux, "3.0.15").expect("gate");

        assert_eq!(decision, GateDecision::Proceed);
        assert!(!vendor.exists());
        executor.assert_finished();
    }

    #[rstest]
    fn failing_probe_is_silent(temp_dir: TempDir) {
        let vendor = temp_dir.path().join("vendor");
        let binary = install_binary(&vendor);
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            &binary.to_string_lossy(),
            &["version"],
            Ok(failure_output("cannot execute binary file")),
        )]);

        let decision = check(&executor, &vendor, Platform::Linux, "3.0.15").expect("gate");

        executor.assert_finished();
        assert_eq!(decision, GateDecision::Skip);
        assert!(vendor.exists());
    }

    #[test]
    fn windows_binary_has_exe_suffix() {
        let binary = openssl_binary(Path::new("vendor"), Platform::Windows);
        assert!(binary.ends_with("bin/openssl.exe"));
    }
}
