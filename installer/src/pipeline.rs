//! Acquisition orchestration.
//!
//! [`acquire`] decides between downloading a prebuilt archive and building
//! from source, runs the version gate, and then drives the matching
//! fetch/verify/extract pipeline followed, in source mode, by the platform
//! build and optional packaging. Every stage runs sequentially and the first
//! error ends the run.

use crate::artefact::download::{HttpClient, fetch_text, open_stream};
use crate::artefact::extraction::{ExtractionError, extract_tar_gz};
use crate::artefact::naming::{PackageName, sidecar_name};
use crate::artefact::packaging::{PackageOutput, PackageParams, package_install_tree};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::artefact::verify::{StreamVerifier, VerificationOutcome, VerifyMode};
use crate::builder::{BuildDirs, BuildStrategy};
use crate::config::{AcquireConfig, ChecksumOverride};
use crate::context::AcquireContext;
use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::gate::{self, GateDecision};
use crate::platform::Platform;
use log::{info, warn};
use std::fmt;
use std::path::Path;

/// How OpenSSL will be acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireMode {
    /// Download and verify the archive at `url`.
    Prebuilt {
        /// The prebuilt archive URL.
        url: String,
    },
    /// Download, verify, and build the canonical source.
    Source,
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub enum AcquireOutcome {
    /// Nothing to do on this platform or configuration.
    NotRequired,
    /// The vendor directory already existed.
    AlreadyPresent,
    /// A prebuilt archive was downloaded and extracted.
    Downloaded {
        /// Digest computed over the downloaded archive.
        digest: Sha256Digest,
    },
    /// The source was built and installed.
    Built {
        /// The package archive, when packaging was requested.
        package: Option<PackageOutput>,
    },
}

impl fmt::Display for AcquireOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequired => f.write_str("OpenSSL is not required on this platform"),
            Self::AlreadyPresent => f.write_str("OpenSSL is already present"),
            Self::Downloaded { digest } => write!(f, "Downloaded prebuilt OpenSSL ({digest})"),
            Self::Built { package: None } => f.write_str("Built OpenSSL from source"),
            Self::Built {
                package: Some(package),
            } => write!(
                f,
                "Built OpenSSL from source and packaged {}",
                package.archive_path.display()
            ),
        }
    }
}

/// Choose the acquisition mode, or `None` when nothing is required.
///
/// A prebuilt archive is used when a URL resolves (the override, or the
/// default on platforms that publish one) and no source build is forced by
/// `--build-from-source`, `--package`, or a Linux static-link request. Linux
/// without the static-link request uses the system library.
///
/// # Examples
///
/// ```
/// use openssl_acquire::config::AcquireConfig;
/// use openssl_acquire::context::AcquireContext;
/// use openssl_acquire::pipeline::{AcquireMode, select_mode};
/// use openssl_acquire::platform::{Arch, Platform};
///
/// let ctx = AcquireContext {
///     platform: Some(Platform::Linux),
///     arch: Some(Arch::X64),
///     ..AcquireContext::for_host("3.0.15", "v".into(), "p".into(), "d".into())
/// };
/// assert_eq!(select_mode(&ctx, &AcquireConfig::default()), None);
///
/// let config = AcquireConfig { static_link: true, ..AcquireConfig::default() };
/// assert_eq!(select_mode(&ctx, &config), Some(AcquireMode::Source));
/// ```
#[must_use]
pub fn select_mode(ctx: &AcquireContext, config: &AcquireConfig) -> Option<AcquireMode> {
    let platform = ctx.platform?;
    let linux_static = platform == Platform::Linux && config.static_link;
    let source_forced = config.build_from_source || config.package || linux_static;

    if !source_forced {
        let url = config
            .binary_url
            .clone()
            .or_else(|| ctx.default_prebuilt_url());
        if let Some(url) = url {
            return Some(AcquireMode::Prebuilt { url });
        }
    }
    if platform == Platform::Linux && !config.static_link {
        return None;
    }
    Some(AcquireMode::Source)
}

/// Acquire OpenSSL according to `ctx` and `config`.
///
/// # Errors
///
/// Returns the first failure from the version gate, build resolution, the
/// network, verification, extraction, the build, or packaging.
pub fn acquire(
    ctx: &AcquireContext,
    config: &AcquireConfig,
    http: &dyn HttpClient,
    executor: &dyn CommandExecutor,
) -> Result<AcquireOutcome> {
    let Some(platform) = ctx.platform else {
        info!("Unsupported platform; OpenSSL acquisition not required");
        return Ok(AcquireOutcome::NotRequired);
    };
    let Some(mode) = select_mode(ctx, config) else {
        info!("Using the system OpenSSL on {platform}; nothing to acquire");
        return Ok(AcquireOutcome::NotRequired);
    };

    match mode {
        AcquireMode::Prebuilt { url } => {
            if already_present(ctx, platform, executor)? {
                return Ok(AcquireOutcome::AlreadyPresent);
            }
            acquire_prebuilt(ctx, config, http, &url)
        }
        AcquireMode::Source => {
            if already_present(ctx, platform, executor)? {
                return Ok(AcquireOutcome::AlreadyPresent);
            }
            let strategy = BuildStrategy::resolve(ctx, config)?;
            acquire_source(ctx, config, http, executor, &strategy)
        }
    }
}

fn already_present(
    ctx: &AcquireContext,
    platform: Platform,
    executor: &dyn CommandExecutor,
) -> Result<bool> {
    let decision = gate::check(executor, &ctx.vendor_dir, platform, &ctx.version)?;
    Ok(decision == GateDecision::Skip)
}

fn acquire_prebuilt(
    ctx: &AcquireContext,
    config: &AcquireConfig,
    http: &dyn HttpClient,
    url: &str,
) -> Result<AcquireOutcome> {
    let mode = match &config.checksum {
        Some(ChecksumOverride::Expected(digest)) => VerifyMode::Validating(digest.clone()),
        Some(ChecksumOverride::Skip) => VerifyMode::Producing,
        None => {
            let digest_url = config
                .checksum_url
                .clone()
                .unwrap_or_else(|| sidecar_name(url));
            VerifyMode::Validating(fetch_digest(http, &digest_url)?)
        }
    };
    let skipped = mode == VerifyMode::Producing;

    let outcome = fetch_and_extract(http, url, mode, &ctx.vendor_dir, 0)?;
    if skipped {
        warn!(
            "Checksum verification disabled; {} hashed to {}",
            url,
            outcome.computed()
        );
    }
    Ok(AcquireOutcome::Downloaded {
        digest: outcome.computed().clone(),
    })
}

fn acquire_source(
    ctx: &AcquireContext,
    config: &AcquireConfig,
    http: &dyn HttpClient,
    executor: &dyn CommandExecutor,
    strategy: &BuildStrategy,
) -> Result<AcquireOutcome> {
    let url = ctx.source_url();
    let expected = fetch_digest(http, &sidecar_name(&url))?;
    // The tarball keeps its `openssl-<version>/` root so the source tree and
    // the install prefix never overlap.
    fetch_and_extract(http, &url, VerifyMode::Validating(expected), &ctx.vendor_dir, 0)?;
    let source_dir = ctx.source_tree_dir();
    if !source_dir.is_dir() {
        return Err(ExtractionError::MissingSourceRoot { expected: source_dir }.into());
    }

    let dirs = BuildDirs {
        source_dir: &source_dir,
        install_prefix: &ctx.vendor_dir,
        patches_dir: &ctx.patches_dir,
    };
    strategy.build(&dirs, executor)?;

    let package = if config.package {
        let params = PackageParams {
            install_root: ctx.vendor_dir.clone(),
            output_dir: ctx.package_dir.clone(),
            name: PackageName::new(ctx.version.clone(), strategy.platform(), strategy.arch()),
        };
        Some(package_install_tree(&params)?)
    } else {
        None
    };
    Ok(AcquireOutcome::Built { package })
}

/// Fetch a digest sidecar and parse its first token.
fn fetch_digest(http: &dyn HttpClient, url: &str) -> Result<Sha256Digest> {
    info!("Fetching digest from {url}");
    let text = fetch_text(http, url)?;
    Ok(Sha256Digest::parse_sidecar(&text, url)?)
}

/// Stream `url` through verification into extraction under `dest`.
///
/// Extracted files stay on disk even when the digest turns out not to
/// match.
///
/// # Errors
///
/// Returns [`crate::error::AcquireError::ChecksumMismatch`] on a digest
/// mismatch, including when a corrupt archive also failed to extract.
pub fn fetch_and_extract(
    http: &dyn HttpClient,
    url: &str,
    mode: VerifyMode,
    dest: &Path,
    strip_components: usize,
) -> Result<VerificationOutcome> {
    info!("Downloading {url}");
    let stream = open_stream(http, url)?;
    let mut verifier = StreamVerifier::new(stream, mode);

    if let Err(err) = extract_tar_gz(&mut verifier, dest, strip_components) {
        // Prefer the digest mismatch over the decode error it usually causes.
        if verifier.drain().is_ok() {
            verifier.finalize()?;
        }
        return Err(err.into());
    }
    verifier.drain()?;
    let (_, outcome) = verifier.finalize()?;
    info!(
        "Verified {} bytes from {url} (sha256 {})",
        outcome.bytes(),
        outcome.computed()
    );
    Ok(outcome)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
