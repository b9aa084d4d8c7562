//! Streaming `.tar.gz` extraction.
//!
//! Decompression and unpacking are composed directly over the incoming byte
//! stream; the decompressed tar is never written to a temporary file. Entry
//! paths are validated to prevent zip-slip and may have leading components
//! stripped.

use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive produced no entries after stripping.
    #[error("archive contains no entries")]
    EmptyArchive,

    /// A source archive did not unpack to the expected top-level directory.
    #[error("source archive did not contain {}", .expected.display())]
    MissingSourceRoot {
        /// The directory the archive should have created.
        expected: PathBuf,
    },
}

/// Summary of a completed extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Number of entries written under the destination.
    pub entries: usize,
}

/// Unpack a gzip-compressed tar stream under `dest`.
///
/// `strip_components` leading path components are removed from every entry;
/// entries that become empty are skipped. The reader is consumed only up to
/// the end of the tar data, so callers hashing the stream should drain it
/// afterwards.
///
/// # Errors
///
/// Returns [`ExtractionError::PathTraversal`] for absolute or `..` paths,
/// [`ExtractionError::EmptyArchive`] when nothing was written, and
/// [`ExtractionError::Io`] on decompression or filesystem failures.
///
/// # Examples
///
/// ```no_run
/// use openssl_acquire::artefact::extraction::extract_tar_gz;
/// use std::path::Path;
///
/// let file = std::fs::File::open("openssl-3.0.15.tar.gz")?;
/// extract_tar_gz(file, Path::new("vendor/openssl"), 1)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract_tar_gz<R: Read>(
    reader: R,
    dest: &Path,
    strip_components: usize,
) -> Result<ExtractSummary, ExtractionError> {
    std::fs::create_dir_all(dest)?;
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut summary = ExtractSummary::default();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();
        validate_entry_path(&entry_path)?;

        let Some(relative) = strip_path(&entry_path, strip_components) else {
            continue;
        };
        let dest_path = dest.join(&relative);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest_path)?;
        summary.entries += 1;
    }

    if summary.entries == 0 {
        return Err(ExtractionError::EmptyArchive);
    }
    Ok(summary)
}

/// Drop the first `count` normal components of `path`.
fn strip_path(path: &Path, count: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(count)
        .collect();
    (!stripped.as_os_str().is_empty()).then_some(stripped)
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
