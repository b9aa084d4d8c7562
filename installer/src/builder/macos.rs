//! macOS build plan.

use super::{BuildDirs, STATIC_FLAGS};
use crate::error::{AcquireError, Result};
use crate::platform::Arch;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Enables the 64-bit NIST P-curve implementations.
const EC_NISTP_FLAG: &str = "enable-ec_nistp_64_gcc_128";

fn deployment_target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("deployment target pattern is valid"))
}

/// A macOS deployment target in `major.minor` form.
///
/// # Examples
///
/// ```
/// use openssl_acquire::builder::DeploymentTarget;
///
/// assert!(DeploymentTarget::try_from("10.15").is_ok());
/// assert!(DeploymentTarget::try_from("10.15.7").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget(String);

impl DeploymentTarget {
    /// The target as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for DeploymentTarget {
    type Error = AcquireError;

    fn try_from(value: &str) -> Result<Self> {
        if !deployment_target_pattern().is_match(value) {
            return Err(AcquireError::configuration(format!(
                "macOS deployment target must look like 10.15, got '{value}'"
            )));
        }
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated macOS build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacOsBuild {
    arch: Arch,
    configure_target: &'static str,
    deployment_target: DeploymentTarget,
}

impl MacOsBuild {
    /// Validate the deployment target and pick the configure target.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Configuration`] when the deployment target is
    /// missing or malformed, and [`AcquireError::UnsupportedConfiguration`]
    /// for architectures other than arm64 and x64.
    pub fn resolve(arch: Option<Arch>, deployment_target: Option<&str>) -> Result<Self> {
        let raw = deployment_target.ok_or_else(|| {
            AcquireError::configuration("a macOS deployment target argument is required")
        })?;
        let deployment_target = DeploymentTarget::try_from(raw)?;
        let (arch, configure_target) = match arch {
            Some(Arch::Arm64) => (Arch::Arm64, "darwin64-arm64-cc"),
            Some(Arch::X64) => (Arch::X64, "darwin64-x86_64-cc"),
            other => {
                return Err(AcquireError::unsupported(format!(
                    "no macOS configure target for architecture {}",
                    other.map_or("unknown", Arch::token)
                )));
            }
        };
        Ok(Self {
            arch,
            configure_target,
            deployment_target,
        })
    }

    /// The architecture being built.
    #[must_use]
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// The OpenSSL configure target.
    #[must_use]
    pub fn configure_target(&self) -> &str {
        self.configure_target
    }

    /// The validated deployment target.
    #[must_use]
    pub fn deployment_target(&self) -> &DeploymentTarget {
        &self.deployment_target
    }

    /// Arguments following `./Configure`.
    #[must_use]
    pub fn configure_args(&self, dirs: &BuildDirs<'_>) -> Vec<String> {
        let mut args = vec![self.configure_target.to_owned()];
        args.extend(STATIC_FLAGS.iter().map(|f| (*f).to_owned()));
        if cfg!(target_endian = "little") {
            args.insert(2, EC_NISTP_FLAG.to_owned());
        }
        args.push(format!("-mmacosx-version-min={}", self.deployment_target));
        args.extend(dirs.prefix_args());
        args
    }
}
