//! Archive handling: fetching, verifying, extracting, and packaging.
//!
//! Every byte pipeline in the installer is assembled from these pieces.
//! Downloads flow through [`progress`], then [`verify`], then
//! [`extraction`]; packaging flows the other way through [`verify`] in
//! producing mode.
//!
//! # Sub-modules
//!
//! - [`download`]: HTTP client trait and `ureq` implementation.
//! - [`error`]: Validation errors for digest values.
//! - [`extraction`]: Streaming `.tar.gz` unpacking with traversal checks.
//! - [`naming`]: Redistributable archive naming.
//! - [`packaging`]: Install-tree archiving with digest sidecars.
//! - [`packaging_error`]: Error types for packaging operations.
//! - [`progress`]: Rate-limited download progress.
//! - [`sha256_digest`]: SHA-256 digest newtype (`Sha256Digest`).
//! - [`verify`]: Pass-through SHA-256 stage (`StreamVerifier`).

pub mod download;
pub mod error;
pub mod extraction;
pub mod naming;
pub mod packaging;
pub mod packaging_error;
pub mod progress;
pub mod sha256_digest;
pub mod verify;
