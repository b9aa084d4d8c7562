//! Repackaging an installed OpenSSL tree for redistribution.
//!
//! The pipeline mirrors extraction: a tar builder feeds a gzip encoder,
//! which feeds a producing-mode [`StreamVerifier`] in front of the output
//! file. The digest captured on the way out is persisted as a sidecar next
//! to the archive once the pipeline has completed.

use super::naming::PackageName;
use super::packaging_error::PackagingError;
use super::sha256_digest::Sha256Digest;
use super::verify::StreamVerifier;
use crate::error::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Subdirectories of the install root that are packaged.
pub const PACKAGED_DIRECTORIES: &[&str] = &["bin", "include", "lib"];

/// File extensions that denote build metadata and are never packaged.
pub const METADATA_EXTENSIONS: &[&str] = &["pc", "cmake", "la"];

/// Directory names that hold build metadata and are never packaged.
pub const METADATA_DIRECTORIES: &[&str] = &["pkgconfig", "cmake"];

/// Mode recorded for every directory entry.
pub const DIRECTORY_MODE: u32 = 0o755;

/// Mode recorded for every non-directory entry.
pub const FILE_MODE: u32 = 0o644;

/// Inputs for [`package_install_tree`].
#[derive(Debug, Clone)]
pub struct PackageParams {
    /// Root of the installed tree (the vendor directory).
    pub install_root: PathBuf,
    /// Directory receiving the archive and its sidecar.
    pub output_dir: PathBuf,
    /// Naming components for the archive.
    pub name: PackageName,
}

/// Output produced by [`package_install_tree`].
#[derive(Debug, Clone)]
pub struct PackageOutput {
    /// Path to the created `.tar.gz` archive.
    pub archive_path: PathBuf,
    /// Path to the digest sidecar.
    pub sidecar_path: PathBuf,
    /// Digest of the archive bytes as written.
    pub digest: Sha256Digest,
}

#[derive(Debug)]
enum EntryKind {
    Directory,
    File,
    Symlink(PathBuf),
}

#[derive(Debug)]
struct TreeEntry {
    source: PathBuf,
    archive_path: PathBuf,
    kind: EntryKind,
}

/// Archive the allow-listed parts of an installed tree and write its digest.
///
/// # Errors
///
/// Returns [`PackagingError::EmptyInstallTree`] when none of
/// [`PACKAGED_DIRECTORIES`] exist, and I/O or walk errors otherwise.
pub fn package_install_tree(params: &PackageParams) -> Result<PackageOutput> {
    let entries = collect_entries(&params.install_root)?;
    fs::create_dir_all(&params.output_dir).map_err(PackagingError::from)?;

    let archive_path = params.output_dir.join(params.name.filename());
    info!("Packaging {} entries into {}", entries.len(), archive_path.display());

    let file = File::create(&archive_path).map_err(PackagingError::from)?;
    let encoder = GzEncoder::new(StreamVerifier::producing(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in &entries {
        append_entry(&mut builder, entry).map_err(PackagingError::from)?;
    }
    let verifier = builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .map_err(PackagingError::from)?;
    let (file, outcome) = verifier.finalize()?;
    file.sync_all().map_err(PackagingError::from)?;

    let digest = outcome.computed().clone();
    let sidecar_path = params.output_dir.join(params.name.sidecar_filename());
    fs::write(&sidecar_path, format!("{digest}\n")).map_err(PackagingError::from)?;
    info!("Wrote {} ({digest})", sidecar_path.display());

    Ok(PackageOutput {
        archive_path,
        sidecar_path,
        digest,
    })
}

/// Whether a tree entry is build metadata that must not be shipped.
fn is_metadata(entry: &DirEntry) -> bool {
    let name = entry.file_name();
    let is_metadata_dir = name
        .to_str()
        .is_some_and(|n| METADATA_DIRECTORIES.contains(&n));
    let has_metadata_ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| METADATA_EXTENSIONS.contains(&ext));
    is_metadata_dir || has_metadata_ext
}

fn collect_entries(root: &Path) -> std::result::Result<Vec<TreeEntry>, PackagingError> {
    let mut entries = Vec::new();
    let mut found_any = false;

    for dir in PACKAGED_DIRECTORIES {
        let top = root.join(dir);
        if !top.is_dir() {
            debug!("{} absent; not packaged", top.display());
            continue;
        }
        found_any = true;

        let walker = WalkDir::new(&top)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_metadata(e));
        for item in walker {
            let item = item.map_err(|source| PackagingError::Walk {
                root: top.clone(),
                source,
            })?;
            let Ok(relative) = item.path().strip_prefix(root) else {
                continue;
            };
            let file_type = item.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink(fs::read_link(item.path())?)
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(TreeEntry {
                source: item.path().to_path_buf(),
                archive_path: relative.to_path_buf(),
                kind,
            });
        }
    }

    if !found_any {
        return Err(PackagingError::EmptyInstallTree(root.to_path_buf()));
    }
    Ok(entries)
}

fn append_entry<W: Write>(builder: &mut tar::Builder<W>, entry: &TreeEntry) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);

    match &entry.kind {
        EntryKind::Directory => {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(DIRECTORY_MODE);
            header.set_size(0);
            builder.append_data(&mut header, &entry.archive_path, io::empty())
        }
        EntryKind::File => {
            let file = File::open(&entry.source)?;
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(FILE_MODE);
            header.set_size(file.metadata()?.len());
            builder.append_data(&mut header, &entry.archive_path, file)
        }
        EntryKind::Symlink(target) => {
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_mode(FILE_MODE);
            header.set_size(0);
            builder.append_link(&mut header, &entry.archive_path, target)
        }
    }
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;
