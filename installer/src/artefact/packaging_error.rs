//! Error types for packaging an installed OpenSSL tree.

use std::path::PathBuf;
use thiserror::Error;

/// Errors arising from package creation.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// An I/O operation failed (reading the tree, writing the archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// Walking the installed tree failed.
    #[error("failed to walk {}: {source}", .root.display())]
    Walk {
        /// The allow-listed directory being walked.
        root: PathBuf,
        /// The underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// None of the allow-listed directories exist under the install root.
    #[error("nothing to package under {}: expected one of bin, include, lib", .0.display())]
    EmptyInstallTree(PathBuf),
}
