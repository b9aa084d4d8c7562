//! Windows (MSVC) build plan.
//!
//! The MSVC toolchain only works inside the environment its `vcvars` script
//! sets up, so the whole configure/build/test/install sequence is written to
//! a batch script that calls `vcvars` first and is then run with `cmd /C`.

use super::{BuildDirs, STATIC_FLAGS};
use crate::error::{AcquireError, Result};
use crate::executor::{CommandExecutor, run_step};
use crate::platform::Arch;
use crate::wrapper::{BuildScript, write_build_script};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default Visual Studio Build Tools installation root.
pub const BUILD_TOOLS_ROOT: &str =
    r"C:\Program Files (x86)\Microsoft Visual Studio\2022\BuildTools";

/// Location of the `vcvars` scripts under the Build Tools root.
const VCVARS_SUBDIR: &str = r"VC\Auxiliary\Build";

/// Windows build target, selected by `x64` or `x86`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowsTarget {
    /// 64-bit build (`VC-WIN64A`).
    Win64A,
    /// 32-bit build (`VC-WIN32`).
    Win32,
}

impl WindowsTarget {
    /// Parse a build-architecture selector.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Configuration`] for anything other than `x64`
    /// or `x86`.
    ///
    /// # Examples
    ///
    /// ```
    /// use openssl_acquire::builder::WindowsTarget;
    ///
    /// assert_eq!(WindowsTarget::from_selector("x64")?.configure_target(), "VC-WIN64A");
    /// assert_eq!(WindowsTarget::from_selector("x86")?.configure_target(), "VC-WIN32");
    /// assert!(WindowsTarget::from_selector("arm64").is_err());
    /// # Ok::<(), openssl_acquire::error::AcquireError>(())
    /// ```
    pub fn from_selector(selector: &str) -> Result<Self> {
        match selector {
            "x64" => Ok(Self::Win64A),
            "x86" => Ok(Self::Win32),
            other => Err(AcquireError::configuration(format!(
                "build architecture must be x64 or x86, got '{other}'"
            ))),
        }
    }

    /// The selector for the running process's architecture.
    #[must_use]
    pub fn default_selector(arch: Option<Arch>) -> &'static str {
        match arch {
            Some(Arch::X86) => "x86",
            _ => "x64",
        }
    }

    /// The OpenSSL configure target.
    #[must_use]
    pub const fn configure_target(self) -> &'static str {
        match self {
            Self::Win64A => "VC-WIN64A",
            Self::Win32 => "VC-WIN32",
        }
    }

    /// The architecture this target produces.
    #[must_use]
    pub const fn arch(self) -> Arch {
        match self {
            Self::Win64A => Arch::X64,
            Self::Win32 => Arch::X86,
        }
    }

    /// File name of the matching compiler environment script.
    #[must_use]
    pub const fn vcvars_script(self) -> &'static str {
        match self {
            Self::Win64A => "vcvars64.bat",
            Self::Win32 => "vcvars32.bat",
        }
    }

    /// Default path of the compiler environment script.
    #[must_use]
    pub fn default_vcvars_path(self) -> PathBuf {
        Path::new(BUILD_TOOLS_ROOT)
            .join(VCVARS_SUBDIR)
            .join(self.vcvars_script())
    }
}

impl fmt::Display for WindowsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.configure_target())
    }
}

/// A validated Windows build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsBuild {
    target: WindowsTarget,
    vcvars: PathBuf,
}

impl WindowsBuild {
    /// Resolve the target and locate the compiler environment script.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Configuration`] for an unknown selector and
    /// [`AcquireError::MissingPrerequisite`] when the `vcvars` script does
    /// not exist.
    pub fn resolve(
        selector: Option<&str>,
        host_arch: Option<Arch>,
        vcvars_override: Option<&Path>,
    ) -> Result<Self> {
        let selector = selector.unwrap_or_else(|| WindowsTarget::default_selector(host_arch));
        let target = WindowsTarget::from_selector(selector)?;
        let vcvars = vcvars_override.map_or_else(|| target.default_vcvars_path(), Path::to_path_buf);
        if !vcvars.is_file() {
            return Err(AcquireError::MissingPrerequisite {
                tool: vcvars.display().to_string(),
                reason: "Visual Studio Build Tools environment script not found".to_owned(),
            });
        }
        Ok(Self { target, vcvars })
    }

    /// The resolved build target.
    #[must_use]
    pub fn target(&self) -> WindowsTarget {
        self.target
    }

    /// The compiler environment script that will be called.
    #[must_use]
    pub fn vcvars(&self) -> &Path {
        &self.vcvars
    }

    /// Arguments following `perl Configure`.
    #[must_use]
    pub fn configure_args(&self, dirs: &BuildDirs<'_>) -> Vec<String> {
        let mut args = vec![self.target.configure_target().to_owned()];
        args.extend(STATIC_FLAGS.iter().map(|f| (*f).to_owned()));
        args.extend(dirs.prefix_args());
        args
    }

    /// Write the build script into the source tree and run it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the script cannot be written, or
    /// [`AcquireError::Subprocess`] if any step in it fails.
    pub fn build(&self, dirs: &BuildDirs<'_>, executor: &dyn CommandExecutor) -> Result<()> {
        let configure_args = self.configure_args(dirs);
        let script = BuildScript {
            vcvars: &self.vcvars,
            configure_args: &configure_args,
        };
        let path = write_build_script(dirs.source_dir, &script)?;
        let path_arg = path.to_string_lossy();
        run_step(
            executor,
            &format!("{} build", self.target),
            "cmd",
            &["/C", &path_arg],
            dirs.source_dir,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingExecutor;
    use rstest::rstest;
    use tempfile::TempDir;

    fn vcvars_stub(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("vcvars64.bat");
        std::fs::write(&path, b"@echo off\r\n").expect("write vcvars");
        path
    }

    #[rstest]
    #[case::x64("x64", WindowsTarget::Win64A, "VC-WIN64A")]
    #[case::x86("x86", WindowsTarget::Win32, "VC-WIN32")]
    fn selectors_map_to_distinct_targets(
        #[case] selector: &str,
        #[case] expected: WindowsTarget,
        #[case] configure: &str,
    ) {
        let target = WindowsTarget::from_selector(selector).expect("valid selector");
        assert_eq!(target, expected);
        assert_eq!(target.configure_target(), configure);
    }

    #[rstest]
    #[case::arm("arm64")]
    #[case::upper("X64")]
    #[case::empty("")]
    fn unknown_selector_is_a_configuration_error(#[case] selector: &str) {
        let err = WindowsBuild::resolve(Some(selector), Some(Arch::X64), None)
            .expect_err("invalid selector");
        assert!(matches!(err, AcquireError::Configuration { .. }));
    }

    #[test]
    fn default_selector_follows_process_arch() {
        assert_eq!(WindowsTarget::default_selector(Some(Arch::X86)), "x86");
        assert_eq!(WindowsTarget::default_selector(Some(Arch::X64)), "x64");
    }

    #[test]
    fn default_vcvars_path_is_under_build_tools() {
        let path = WindowsTarget::Win32.default_vcvars_path();
        assert!(path.starts_with(BUILD_TOOLS_ROOT));
        assert!(path.ends_with("vcvars32.bat"));
    }

    #[test]
    fn missing_vcvars_is_a_missing_prerequisite() {
        let temp = TempDir::new().expect("temp dir");
        let err = WindowsBuild::resolve(
            Some("x64"),
            None,
            Some(&temp.path().join("no-such-vcvars.bat")),
        )
        .expect_err("missing script");
        assert!(matches!(err, AcquireError::MissingPrerequisite { .. }));
    }

    #[test]
    fn build_runs_generated_script_through_cmd() {
        let temp = TempDir::new().expect("temp dir");
        let vcvars = vcvars_stub(&temp);
        let prefix = temp.path().join("vendor");
        let source = prefix.join("openssl-3.0.15");
        std::fs::create_dir_all(&source).expect("mkdir");
        let build = WindowsBuild::resolve(Some("x64"), None, Some(&vcvars)).expect("valid");
        let executor = RecordingExecutor::new();
        let dirs = BuildDirs {
            source_dir: &source,
            install_prefix: &prefix,
            patches_dir: temp.path(),
        };

        build.build(&dirs, &executor).expect("build");

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].cmd, "cmd");
        assert_eq!(calls[0].args[0], "/C");
        let script = std::fs::read_to_string(&calls[0].args[1]).expect("script written");
        assert!(script.contains("VC-WIN64A"));
        assert!(script.contains("nmake install_sw"));
        assert!(script.contains(&format!("--prefix={}", prefix.display())));
        assert_eq!(calls[0].cwd, source);
    }
}
