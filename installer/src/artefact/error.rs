//! Error types for artefact values parsed from configuration or the network.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A digest sidecar contained no digest at all.
    #[error("digest sidecar from {source_name} is empty")]
    EmptySidecar {
        /// Where the sidecar text came from (URL or path).
        source_name: String,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
