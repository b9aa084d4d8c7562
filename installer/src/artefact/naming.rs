//! Package artifact naming.
//!
//! Archives are named `openssl-<version>-<platform>-<arch>.tar.gz` and their
//! digest sidecar appends `.sha256` to the archive filename. The same
//! convention is used to build the default prebuilt download URL, so a
//! package produced here can be published and later fetched as a prebuilt.

use crate::platform::{Arch, Platform};
use std::fmt;

/// The fixed prefix for all package archive names.
const PACKAGE_PREFIX: &str = "openssl";

/// The fixed file extension for package archives.
pub const PACKAGE_EXTENSION: &str = ".tar.gz";

/// The suffix appended to an archive filename to name its digest sidecar.
pub const SIDECAR_SUFFIX: &str = ".sha256";

/// A fully-qualified package archive name.
///
/// # Examples
///
/// ```
/// use openssl_acquire::artefact::naming::PackageName;
/// use openssl_acquire::platform::{Arch, Platform};
///
/// let name = PackageName::new("3.0.15", Platform::MacOs, Arch::Arm64);
/// assert_eq!(name.filename(), "openssl-3.0.15-darwin-arm64.tar.gz");
/// assert_eq!(name.sidecar_filename(), "openssl-3.0.15-darwin-arm64.tar.gz.sha256");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName {
    version: String,
    platform: Platform,
    arch: Arch,
}

impl PackageName {
    /// Create a package name from its components.
    #[must_use]
    pub fn new(version: impl Into<String>, platform: Platform, arch: Arch) -> Self {
        Self {
            version: version.into(),
            platform,
            arch,
        }
    }

    /// The archive filename.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }

    /// The digest sidecar filename.
    #[must_use]
    pub fn sidecar_filename(&self) -> String {
        sidecar_name(&self.filename())
    }

    /// The OpenSSL version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The target platform.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The target architecture.
    #[must_use]
    pub fn arch(&self) -> Arch {
        self.arch
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PACKAGE_PREFIX}-{}-{}-{}{PACKAGE_EXTENSION}",
            self.version, self.platform, self.arch
        )
    }
}

/// Name the digest sidecar for an artifact filename or URL.
#[must_use]
pub fn sidecar_name(artifact: &str) -> String {
    format!("{artifact}{SIDECAR_SUFFIX}")
}
