//! Error types for OpenSSL acquisition.
//!
//! Each variant names the stage that failed and carries enough context for
//! the binary to print an actionable message before exiting non-zero.

use crate::artefact::download::DownloadError;
use crate::artefact::error::ArtefactError;
use crate::artefact::extraction::ExtractionError;
use crate::artefact::packaging_error::PackagingError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while acquiring, building, or packaging OpenSSL.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// A transport or HTTP status error while fetching an archive or digest.
    #[error("network failure: {0}")]
    Network(#[from] DownloadError),

    /// The digest computed over a stream disagrees with the expected digest.
    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Hex digest the stream was expected to hash to.
        expected: String,
        /// Hex digest actually computed over the stream.
        actual: String,
    },

    /// A required external tool or script is absent.
    #[error("missing prerequisite {tool}: {reason}")]
    MissingPrerequisite {
        /// Name or path of the missing tool.
        tool: String,
        /// Description of how the absence was detected.
        reason: String,
    },

    /// The selected platform, architecture, or target cannot be built.
    #[error("unsupported configuration: {reason}")]
    UnsupportedConfiguration {
        /// Description of the unsupported combination.
        reason: String,
    },

    /// A patch from the patches directory failed to apply.
    #[error("failed to apply patch {}: {reason}", .patch.display())]
    PatchApplication {
        /// Path of the patch that failed.
        patch: PathBuf,
        /// Output of the patch tool.
        reason: String,
    },

    /// An external build step exited unsuccessfully.
    #[error("{step} failed (exit code {}): {stderr}", .code.map_or_else(|| "none".to_owned(), |c| c.to_string()))]
    Subprocess {
        /// Human-readable name of the step, e.g. `make test`.
        step: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured standard error of the step.
        stderr: String,
    },

    /// A digest value (literal or published sidecar) is malformed.
    #[error("invalid digest: {0}")]
    InvalidDigest(#[from] ArtefactError),

    /// A configuration value is missing or malformed.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Description of the offending value.
        reason: String,
    },

    /// Archive extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Packaging the installed tree failed.
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl AcquireError {
    /// Shorthand for a [`AcquireError::Configuration`] error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`AcquireError::UnsupportedConfiguration`] error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration {
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`AcquireError`].
pub type Result<T> = std::result::Result<T, AcquireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_shows_both_digests() {
        let err = AcquireError::ChecksumMismatch {
            expected: "a".repeat(64),
            actual: "b".repeat(64),
        };
        let msg = err.to_string();
        assert!(msg.contains(&"a".repeat(64)));
        assert!(msg.contains(&"b".repeat(64)));
    }

    #[test]
    fn subprocess_error_includes_step_and_code() {
        let err = AcquireError::Subprocess {
            step: "make test".to_owned(),
            code: Some(2),
            stderr: "test_evp failed".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("make test"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("test_evp failed"));
    }

    #[test]
    fn subprocess_error_without_code_says_none() {
        let err = AcquireError::Subprocess {
            step: "make build_libs".to_owned(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit code none"));
    }

    #[test]
    fn patch_error_includes_patch_path() {
        let err = AcquireError::PatchApplication {
            patch: PathBuf::from("patches/001-fix-all.patch"),
            reason: "hunk FAILED".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("001-fix-all.patch"));
        assert!(msg.contains("hunk FAILED"));
    }

    #[test]
    fn network_error_preserves_source() {
        let err = AcquireError::from(DownloadError::NotFound {
            url: "https://example.test/openssl.tar.gz".to_owned(),
        });
        assert!(err.to_string().contains("network failure"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
