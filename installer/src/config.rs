//! Typed acquisition configuration.
//!
//! Built once from the parsed command line. Components read options from
//! here and never consult the environment themselves.

use crate::artefact::sha256_digest::Sha256Digest;
use crate::cli::Cli;
use crate::error::Result;
use camino::Utf8PathBuf;

/// Sentinel that disables prebuilt verification.
pub const CHECKSUM_SKIP: &str = "skip";

/// An explicit expectation for the prebuilt archive digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumOverride {
    /// Validate against this digest.
    Expected(Sha256Digest),
    /// Do not validate; the computed digest is only logged.
    Skip,
}

impl ChecksumOverride {
    /// Parse a literal digest or the `skip` sentinel (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AcquireError::InvalidDigest`] when the value
    /// is neither `skip` nor a 64-character hex digest.
    ///
    /// # Examples
    ///
    /// ```
    /// use openssl_acquire::config::ChecksumOverride;
    ///
    /// assert_eq!(ChecksumOverride::parse("SKIP")?, ChecksumOverride::Skip);
    /// assert!(ChecksumOverride::parse("abc").is_err());
    /// # Ok::<(), openssl_acquire::error::AcquireError>(())
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(CHECKSUM_SKIP) {
            return Ok(Self::Skip);
        }
        Ok(Self::Expected(Sha256Digest::try_from(
            value.to_ascii_lowercase(),
        )?))
    }
}

/// Every recognised option, validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquireConfig {
    /// Build a static library on Linux.
    pub static_link: bool,
    /// Build from source even when a prebuilt archive is available.
    pub build_from_source: bool,
    /// Package the installed tree after a source build.
    pub package: bool,
    /// Replacement prebuilt archive URL.
    pub binary_url: Option<String>,
    /// Literal digest or skip sentinel for the prebuilt archive.
    pub checksum: Option<ChecksumOverride>,
    /// Alternate location of the prebuilt digest.
    pub checksum_url: Option<String>,
    /// Windows build architecture selector.
    pub build_arch: Option<String>,
    /// Windows compiler environment script.
    pub vcvars_path: Option<Utf8PathBuf>,
    /// macOS deployment target, validated when a macOS build is resolved.
    pub deployment_target: Option<String>,
}

impl AcquireConfig {
    /// Translate parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when the checksum override is malformed.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let checksum = cli
            .checksum
            .as_deref()
            .map(ChecksumOverride::parse)
            .transpose()?;
        Ok(Self {
            static_link: cli.static_link,
            build_from_source: cli.build_from_source,
            package: cli.package,
            binary_url: non_empty(cli.binary_url.as_deref()),
            checksum,
            checksum_url: non_empty(cli.checksum_url.as_deref()),
            build_arch: non_empty(cli.build_arch.as_deref()),
            vcvars_path: cli.vcvars_path.clone(),
            deployment_target: non_empty(cli.deployment_target.as_deref()),
        })
    }
}

/// Treat empty or blank values (e.g. `VAR=`) as unset.
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}
