//! Platform build strategies for OpenSSL source trees.
//!
//! A [`BuildStrategy`] is resolved from the acquisition context and
//! configuration before anything is downloaded, so malformed deployment
//! targets, unknown architectures, and missing compiler environments are
//! reported without side effects. Executing the strategy runs the configure,
//! patch, build, test, and install steps in order; the first failing step
//! aborts the build and leaves the tree as it is.
//!
//! # Sub-modules
//!
//! - [`macos`]: Darwin configure targets and deployment-target validation.
//! - [`linux`]: Static builds with hidden symbol visibility.
//! - [`windows`]: MSVC builds driven through a generated batch script.
//! - [`patches`]: Platform-filtered patch selection and application.

pub mod linux;
pub mod macos;
pub mod patches;
pub mod windows;

use crate::config::AcquireConfig;
use crate::context::AcquireContext;
use crate::error::{AcquireError, Result};
use crate::executor::{CommandExecutor, run_step};
use crate::platform::{Arch, Platform};
use log::info;
use std::path::Path;

pub use linux::LinuxBuild;
pub use macos::{DeploymentTarget, MacOsBuild};
pub use windows::{WindowsBuild, WindowsTarget};

/// Configure flags shared by every platform: static libraries only, no
/// legacy SSL protocols, no compression.
pub const STATIC_FLAGS: &[&str] = &["no-shared", "no-ssl2", "no-ssl3", "no-comp"];

/// Directories a build operates on.
#[derive(Debug, Clone, Copy)]
pub struct BuildDirs<'a> {
    /// The extracted source tree; every step runs here.
    pub source_dir: &'a Path,
    /// Install prefix passed to `Configure`.
    pub install_prefix: &'a Path,
    /// Directory holding `*.patch` files.
    pub patches_dir: &'a Path,
}

impl BuildDirs<'_> {
    /// `--prefix` and `--openssldir` arguments for the install prefix.
    #[must_use]
    pub fn prefix_args(&self) -> [String; 2] {
        let prefix = self.install_prefix.display();
        [format!("--prefix={prefix}"), format!("--openssldir={prefix}")]
    }
}

/// A validated, platform-specific build plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Build for macOS.
    MacOs(MacOsBuild),
    /// Static build for Linux.
    Linux(LinuxBuild),
    /// MSVC build for Windows.
    Windows(WindowsBuild),
}

impl BuildStrategy {
    /// Validate the build inputs for the context's platform.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Configuration`] for malformed arguments,
    /// [`AcquireError::UnsupportedConfiguration`] for platforms or
    /// architectures without a configure target, and
    /// [`AcquireError::MissingPrerequisite`] when the Windows compiler
    /// environment script is absent.
    pub fn resolve(ctx: &AcquireContext, config: &AcquireConfig) -> Result<Self> {
        let platform = ctx
            .platform
            .ok_or_else(|| AcquireError::unsupported("no build strategy for this platform"))?;
        match platform {
            Platform::MacOs => {
                MacOsBuild::resolve(ctx.arch, config.deployment_target.as_deref()).map(Self::MacOs)
            }
            Platform::Linux => LinuxBuild::resolve(ctx.arch).map(Self::Linux),
            Platform::Windows => WindowsBuild::resolve(
                config.build_arch.as_deref(),
                ctx.arch,
                config.vcvars_path.as_ref().map(|p| p.as_std_path()),
            )
            .map(Self::Windows),
        }
    }

    /// The platform this strategy builds for.
    #[must_use]
    pub fn platform(&self) -> Platform {
        match self {
            Self::MacOs(_) => Platform::MacOs,
            Self::Linux(_) => Platform::Linux,
            Self::Windows(_) => Platform::Windows,
        }
    }

    /// The architecture this strategy builds for.
    #[must_use]
    pub fn arch(&self) -> Arch {
        match self {
            Self::MacOs(build) => build.arch(),
            Self::Linux(build) => build.arch(),
            Self::Windows(build) => build.target().arch(),
        }
    }

    /// Run the full build sequence.
    ///
    /// # Errors
    ///
    /// Returns the first step's failure; see [`run_step`] and
    /// [`patches::apply_patches`].
    pub fn build(&self, dirs: &BuildDirs<'_>, executor: &dyn CommandExecutor) -> Result<()> {
        info!(
            "Building OpenSSL for {} in {}",
            self.platform(),
            dirs.source_dir.display()
        );
        match self {
            Self::MacOs(build) => {
                run_make_sequence(executor, dirs, Platform::MacOs, &build.configure_args(dirs))
            }
            Self::Linux(build) => {
                run_make_sequence(executor, dirs, Platform::Linux, &build.configure_args(dirs))
            }
            Self::Windows(build) => build.build(dirs, executor),
        }
    }
}

/// Configure, patch, then `make build_libs`, `make test`, `make install_sw`.
fn run_make_sequence(
    executor: &dyn CommandExecutor,
    dirs: &BuildDirs<'_>,
    platform: Platform,
    configure_args: &[String],
) -> Result<()> {
    let source = dirs.source_dir;
    let mut args = vec!["./Configure"];
    args.extend(configure_args.iter().map(String::as_str));
    run_step(executor, "Configure", "perl", &args, source)?;

    patches::apply_patches(executor, dirs.patches_dir, platform, source)?;

    for target in ["build_libs", "test", "install_sw"] {
        info!("make {target}");
        run_step(executor, &format!("make {target}"), "make", &[target], source)?;
    }
    Ok(())
}
