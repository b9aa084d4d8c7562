//! Platform-filtered source patches.
//!
//! Patch files live in a single directory and are named
//! `<anything>-<token>.patch`, where the token is a platform token
//! (`darwin`, `linux`, `win32`) or `all`. Matching patches are applied in
//! file-name order with `patch -p0` from the root of the source tree.

use crate::error::{AcquireError, Result};
use crate::executor::CommandExecutor;
use crate::platform::Platform;
use log::{debug, info};
use std::path::{Path, PathBuf};

const PATCH_EXTENSION: &str = ".patch";
const ALL_PLATFORMS: &str = "all";

/// The platform token encoded in a patch file name.
///
/// # Examples
///
/// ```
/// use openssl_acquire::builder::patches::patch_token;
///
/// assert_eq!(patch_token("001-fix-ec-darwin.patch"), Some("darwin"));
/// assert_eq!(patch_token("notes.txt"), None);
/// ```
#[must_use]
pub fn patch_token(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(PATCH_EXTENSION)
        .and_then(|stem| stem.rsplit_once('-'))
        .map(|(_, token)| token)
}

/// List the patches in `patches_dir` that apply to `platform`, sorted by name.
///
/// A missing directory yields no patches.
///
/// # Errors
///
/// Returns an I/O error if the directory exists but cannot be read.
pub fn select_patches(patches_dir: &Path, platform: Platform) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(patches_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("no patches directory at {}", patches_dir.display());
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };

    let mut selected = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(token) = name.to_str().and_then(patch_token) else {
            continue;
        };
        if token == platform.token() || token == ALL_PLATFORMS {
            selected.push(entry.path());
        }
    }
    selected.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(selected)
}

/// Apply every selected patch to the tree at `source_dir`.
///
/// Returns the number of patches applied. Patches already applied before a
/// failure are left in place.
///
/// # Errors
///
/// Returns [`AcquireError::PatchApplication`] for the first patch the tool
/// rejects.
pub fn apply_patches(
    executor: &dyn CommandExecutor,
    patches_dir: &Path,
    platform: Platform,
    source_dir: &Path,
) -> Result<usize> {
    let patches = select_patches(patches_dir, platform)?;
    for patch in &patches {
        info!("Applying {}", patch.display());
        let patch_arg = patch.to_string_lossy();
        let output = executor.run("patch", &["-p0", "-i", &patch_arg], source_dir)?;
        if !output.status.success() {
            let mut reason = String::from_utf8_lossy(&output.stdout).into_owned();
            reason.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(AcquireError::PatchApplication {
                patch: patch.clone(),
                reason: reason.trim().to_owned(),
            });
        }
    }
    Ok(patches.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingExecutor;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn patches_dir() -> TempDir {
        let dir = TempDir::new().expect("temp dir creation succeeds");
        for name in ["c-darwin.patch", "a-linux.patch", "b-all.patch", "README.md"] {
            std::fs::write(dir.path().join(name), b"--- a\n+++ b\n").expect("write patch");
        }
        dir
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(ToOwned::to_owned))
            .collect()
    }

    #[rstest]
    #[case::linux(Platform::Linux, &["a-linux.patch", "b-all.patch"])]
    #[case::darwin(Platform::MacOs, &["b-all.patch", "c-darwin.patch"])]
    #[case::windows(Platform::Windows, &["b-all.patch"])]
    fn selects_platform_and_shared_patches(
        patches_dir: TempDir,
        #[case] platform: Platform,
        #[case] expected: &[&str],
    ) {
        let selected = select_patches(patches_dir.path(), platform).expect("select");
        assert_eq!(names(&selected), expected);
    }

    #[rstest]
    #[case::hyphenated_stem("0001-ec-nistp-linux.patch", Some("linux"))]
    #[case::no_token("fix.patch", None)]
    #[case::wrong_extension("a-linux.diff", None)]
    fn extracts_trailing_token(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(patch_token(name), expected);
    }

    #[test]
    fn missing_directory_means_no_patches() {
        let temp = TempDir::new().expect("temp dir");
        let selected =
            select_patches(&temp.path().join("absent"), Platform::Linux).expect("select");
        assert!(selected.is_empty());
    }

    #[rstest]
    fn applies_in_name_order_from_source_root(patches_dir: TempDir) {
        let executor = RecordingExecutor::new();
        let source = Path::new("/src/openssl");

        let applied =
            apply_patches(&executor, patches_dir.path(), Platform::Linux, source).expect("apply");

        assert_eq!(applied, 2);
        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.cmd == "patch" && c.cwd == source));
        assert!(calls[0].args[2].ends_with("a-linux.patch"));
        assert!(calls[1].args[2].ends_with("b-all.patch"));
        assert_eq!(&calls[0].args[..2], ["-p0", "-i"]);
    }

    #[rstest]
    fn first_rejected_patch_stops_the_run(patches_dir: TempDir) {
        let executor = RecordingExecutor::new().fail_on("a-linux", "1 out of 1 hunk FAILED");

        let err = apply_patches(&executor, patches_dir.path(), Platform::Linux, Path::new("."))
            .expect_err("patch fails");

        match err {
            AcquireError::PatchApplication { patch, reason } => {
                assert!(patch.ends_with("a-linux.patch"));
                assert!(reason.contains("hunk FAILED"));
            }
            other => panic!("expected PatchApplication, got {other:?}"),
        }
        assert_eq!(executor.calls().len(), 1);
    }
}
