//! The fixed facts of one acquisition run.
//!
//! Paths and URL templates that would otherwise be process-wide constants
//! live on [`AcquireContext`], so tests can point a run at temporary
//! directories and fake endpoints.

use crate::artefact::naming::PackageName;
use crate::platform::{Arch, Platform};
use std::path::PathBuf;

/// Canonical source tarball location; `{version}` is substituted.
pub const SOURCE_URL_TEMPLATE: &str = "https://www.openssl.org/source/openssl-{version}.tar.gz";

/// Default prebuilt archive location; `{version}` and `{filename}` are
/// substituted, the latter with the package naming convention.
pub const PREBUILT_URL_TEMPLATE: &str =
    "https://github.com/openssl/openssl/releases/download/openssl-{version}/{filename}";

/// Platforms with a published prebuilt archive.
const PREBUILT_PLATFORMS: &[Platform] = &[Platform::MacOs, Platform::Windows];

/// Desired version, host, directories, and URL templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireContext {
    /// The OpenSSL version to acquire.
    pub version: String,
    /// The host platform, or `None` when unsupported.
    pub platform: Option<Platform>,
    /// The host architecture, or `None` when unknown.
    pub arch: Option<Arch>,
    /// Extraction and install directory.
    pub vendor_dir: PathBuf,
    /// Directory holding `*.patch` files.
    pub patches_dir: PathBuf,
    /// Directory receiving packaged archives.
    pub package_dir: PathBuf,
    /// Template for the source tarball URL.
    pub source_url_template: String,
    /// Template for the default prebuilt archive URL.
    pub prebuilt_url_template: String,
}

impl AcquireContext {
    /// A context for the running host with the default URL templates.
    #[must_use]
    pub fn for_host(
        version: impl Into<String>,
        vendor_dir: PathBuf,
        patches_dir: PathBuf,
        package_dir: PathBuf,
    ) -> Self {
        Self {
            version: version.into(),
            platform: Platform::current(),
            arch: Arch::current(),
            vendor_dir,
            patches_dir,
            package_dir,
            source_url_template: SOURCE_URL_TEMPLATE.to_owned(),
            prebuilt_url_template: PREBUILT_URL_TEMPLATE.to_owned(),
        }
    }

    /// The canonical source tarball URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use openssl_acquire::context::AcquireContext;
    ///
    /// let ctx = AcquireContext::for_host("3.0.15", "v".into(), "p".into(), "d".into());
    /// assert_eq!(ctx.source_url(), "https://www.openssl.org/source/openssl-3.0.15.tar.gz");
    /// ```
    #[must_use]
    pub fn source_url(&self) -> String {
        self.source_url_template.replace("{version}", &self.version)
    }

    /// Where the source tarball unpacks: `<vendor>/openssl-<version>`.
    ///
    /// Builds run here and install into [`Self::vendor_dir`].
    #[must_use]
    pub fn source_tree_dir(&self) -> PathBuf {
        self.vendor_dir.join(format!("openssl-{}", self.version))
    }

    /// Naming for this run's package archive, when the host is known.
    #[must_use]
    pub fn package_name(&self) -> Option<PackageName> {
        Some(PackageName::new(
            self.version.clone(),
            self.platform?,
            self.arch?,
        ))
    }

    /// The default prebuilt URL, on platforms that publish one.
    #[must_use]
    pub fn default_prebuilt_url(&self) -> Option<String> {
        let name = self.package_name()?;
        if !PREBUILT_PLATFORMS.contains(&name.platform()) {
            return None;
        }
        Some(
            self.prebuilt_url_template
                .replace("{version}", &self.version)
                .replace("{filename}", &name.filename()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn context(platform: Option<Platform>, arch: Option<Arch>) -> AcquireContext {
        AcquireContext {
            platform,
            arch,
            ..AcquireContext::for_host("3.0.15", "v".into(), "p".into(), "d".into())
        }
    }

    #[rstest]
    #[case::darwin(Platform::MacOs, Arch::Arm64, Some("openssl-3.0.15-darwin-arm64.tar.gz"))]
    #[case::windows(Platform::Windows, Arch::X86, Some("openssl-3.0.15-win32-x86.tar.gz"))]
    #[case::linux(Platform::Linux, Arch::X64, None)]
    fn default_prebuilt_url_follows_platform(
        #[case] platform: Platform,
        #[case] arch: Arch,
        #[case] filename: Option<&str>,
    ) {
        let url = context(Some(platform), Some(arch)).default_prebuilt_url();
        match filename {
            Some(name) => {
                let url = url.expect("prebuilt published");
                assert!(url.ends_with(name), "{url}");
                assert!(url.contains("openssl-3.0.15/"), "{url}");
            }
            None => assert!(url.is_none()),
        }
    }

    #[test]
    fn unknown_host_has_no_package_name() {
        assert!(context(None, Some(Arch::X64)).package_name().is_none());
        assert!(context(Some(Platform::MacOs), None).default_prebuilt_url().is_none());
    }

    #[test]
    fn source_url_uses_template() {
        let ctx = AcquireContext {
            source_url_template: "http://mirror.test/{version}/src.tar.gz".to_owned(),
            ..context(Some(Platform::Linux), Some(Arch::X64))
        };
        assert_eq!(ctx.source_url(), "http://mirror.test/3.0.15/src.tar.gz");
    }

    #[test]
    fn source_tree_is_nested_under_vendor_dir() {
        let ctx = context(Some(Platform::Linux), Some(Arch::X64));
        let source = ctx.source_tree_dir();
        assert_eq!(source, std::path::Path::new("v/openssl-3.0.15"));
        assert_ne!(source, ctx.vendor_dir);
    }
}
