//! CLI argument definitions for the OpenSSL acquisition tool.
//!
//! Every option can also be supplied through an `OPENSSL_ACQUIRE_*`
//! environment variable so build scripts can configure the tool without
//! assembling a command line. Parsing lives here; translation into the typed
//! configuration happens in [`crate::config`].

use camino::Utf8PathBuf;
use clap::Parser;

/// OpenSSL version acquired when none is given.
pub const DEFAULT_OPENSSL_VERSION: &str = "3.0.15";

/// Default extraction and install directory.
pub const DEFAULT_VENDOR_DIR: &str = "vendor/openssl";

/// Default directory searched for `*.patch` files.
pub const DEFAULT_PATCHES_DIR: &str = "patches/openssl";

/// Default directory receiving packaged archives.
pub const DEFAULT_PACKAGE_DIR: &str = "dist";

/// Acquire the vendored OpenSSL dependency.
#[derive(Parser, Debug, Clone)]
#[command(name = "openssl-acquire")]
#[command(version, about)]
#[command(long_about = concat!(
    "Acquire the vendored OpenSSL dependency.\n\n",
    "On macOS and Windows a prebuilt archive is downloaded and verified against ",
    "its published SHA-256 digest. With --build-from-source or --package, or on ",
    "Linux with --static-link, the canonical source tarball is downloaded, ",
    "verified, configured, patched, built, tested, and installed instead.\n\n",
    "If the vendor directory already exists, nothing is done.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Download the prebuilt archive for this platform:\n",
    "    $ openssl-acquire\n\n",
    "  Build from source on macOS targeting 10.15 and package the result:\n",
    "    $ openssl-acquire --build-from-source --package 10.15\n\n",
    "  Static build on Linux:\n",
    "    $ OPENSSL_ACQUIRE_STATIC_LINK=1 openssl-acquire\n\n",
    "  Use a mirror without verification:\n",
    "    $ openssl-acquire --binary-url https://mirror.test/openssl.tar.gz --checksum skip",
))]
pub struct Cli {
    /// OpenSSL version to acquire.
    #[arg(
        long,
        env = "OPENSSL_ACQUIRE_VERSION",
        value_name = "VERSION",
        default_value = DEFAULT_OPENSSL_VERSION
    )]
    pub openssl_version: String,

    /// Build a static OpenSSL on Linux (otherwise the system library is used).
    #[arg(long, env = "OPENSSL_ACQUIRE_STATIC_LINK")]
    pub static_link: bool,

    /// Build from source even where a prebuilt archive is available.
    #[arg(long, env = "OPENSSL_ACQUIRE_BUILD_FROM_SOURCE")]
    pub build_from_source: bool,

    /// Replace the computed prebuilt archive URL.
    #[arg(long, env = "OPENSSL_ACQUIRE_BINARY_URL", value_name = "URL")]
    pub binary_url: Option<String>,

    /// Expected SHA-256 of the prebuilt archive, or `skip` to disable checking.
    #[arg(long, env = "OPENSSL_ACQUIRE_CHECKSUM", value_name = "HEX|skip")]
    pub checksum: Option<String>,

    /// Fetch the expected prebuilt digest from this URL instead.
    #[arg(long, env = "OPENSSL_ACQUIRE_CHECKSUM_URL", value_name = "URL")]
    pub checksum_url: Option<String>,

    /// Windows build architecture (`x64` or `x86`) [default: process arch].
    #[arg(long, env = "OPENSSL_ACQUIRE_BUILD_ARCH", value_name = "ARCH")]
    pub build_arch: Option<String>,

    /// Path to the MSVC `vcvars` script [default: Build Tools location].
    #[arg(long, env = "OPENSSL_ACQUIRE_VCVARS_PATH", value_name = "FILE")]
    pub vcvars_path: Option<Utf8PathBuf>,

    /// Package the installed tree after a source build.
    #[arg(long, env = "OPENSSL_ACQUIRE_PACKAGE")]
    pub package: bool,

    /// Directory OpenSSL is extracted and installed into.
    #[arg(
        long,
        env = "OPENSSL_ACQUIRE_VENDOR_DIR",
        value_name = "DIR",
        default_value = DEFAULT_VENDOR_DIR
    )]
    pub vendor_dir: Utf8PathBuf,

    /// Directory holding `<name>-<platform|all>.patch` files.
    #[arg(
        long,
        env = "OPENSSL_ACQUIRE_PATCHES_DIR",
        value_name = "DIR",
        default_value = DEFAULT_PATCHES_DIR
    )]
    pub patches_dir: Utf8PathBuf,

    /// Directory receiving packaged archives.
    #[arg(
        long,
        env = "OPENSSL_ACQUIRE_PACKAGE_DIR",
        value_name = "DIR",
        default_value = DEFAULT_PACKAGE_DIR
    )]
    pub package_dir: Utf8PathBuf,

    /// macOS deployment target (`major.minor`), required for macOS builds.
    #[arg(value_name = "DEPLOYMENT_TARGET")]
    pub deployment_target: Option<String>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// The log level selected by `-v` and `-q`.
    ///
    /// # Examples
    ///
    /// ```
    /// use openssl_acquire::cli::Cli;
    ///
    /// let cli = Cli { verbosity: 1, ..Cli::default() };
    /// assert_eq!(cli.log_level(), log::LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Warn;
        }
        match self.verbosity {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

impl Default for Cli {
    /// Creates a `Cli` with every default applied and no flags set.
    fn default() -> Self {
        Self {
            openssl_version: DEFAULT_OPENSSL_VERSION.to_owned(),
            static_link: false,
            build_from_source: false,
            binary_url: None,
            checksum: None,
            checksum_url: None,
            build_arch: None,
            vcvars_path: None,
            package: false,
            vendor_dir: Utf8PathBuf::from(DEFAULT_VENDOR_DIR),
            patches_dir: Utf8PathBuf::from(DEFAULT_PATCHES_DIR),
            package_dir: Utf8PathBuf::from(DEFAULT_PACKAGE_DIR),
            deployment_target: None,
            verbosity: 0,
            quiet: false,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
