//! External command execution.
//!
//! Build steps, patching, and the version probe all shell out. They go
//! through [`CommandExecutor`] so tests can substitute a scripted stub and
//! assert on the exact command lines without touching the host.

use crate::error::{AcquireError, Result};
use log::debug;
use std::path::Path;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `cmd` with `args` in `cwd` and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::MissingPrerequisite`] when the program cannot
    /// be found, or any other I/O error encountered while spawning it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use openssl_acquire::executor::{CommandExecutor, SystemCommandExecutor};
    /// use std::path::Path;
    ///
    /// let output = SystemCommandExecutor.run("perl", &["-v"], Path::new("."))?;
    /// assert!(output.status.success());
    /// # Ok::<(), openssl_acquire::error::AcquireError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => AcquireError::MissingPrerequisite {
                    tool: cmd.to_owned(),
                    reason: format!("could not be started: {err}"),
                },
                _ => AcquireError::from(err),
            })
    }
}

/// Run one named build step and require a zero exit status.
///
/// # Errors
///
/// Returns [`AcquireError::Subprocess`] naming `step` when the command exits
/// unsuccessfully, or the executor's own error when it cannot be started.
pub fn run_step(
    executor: &dyn CommandExecutor,
    step: &str,
    cmd: &str,
    args: &[&str],
    cwd: &Path,
) -> Result<Output> {
    debug!("{step}: {cmd} {}", args.join(" "));
    let output = executor.run(cmd, args, cwd)?;
    if !output.status.success() {
        return Err(AcquireError::Subprocess {
            step: step.to_owned(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};

    #[test]
    fn run_step_passes_through_success() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "make",
            &["build_libs"],
            Ok(success_output()),
        )]);
        run_step(&executor, "make build_libs", "make", &["build_libs"], Path::new("."))
            .expect("step succeeds");
        executor.assert_finished();
    }

    #[test]
    fn run_step_maps_failure_to_subprocess_error() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "make",
            &["test"],
            Ok(failure_output("test_evp failed\n")),
        )]);
        let err = run_step(&executor, "make test", "make", &["test"], Path::new("."))
            .expect_err("step fails");
        match err {
            AcquireError::Subprocess { step, code, stderr } => {
                assert_eq!(step, "make test");
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "test_evp failed");
            }
            other => panic!("expected Subprocess, got {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_a_missing_prerequisite() {
        let err = SystemCommandExecutor
            .run("openssl-acquire-no-such-tool", &[], Path::new("."))
            .expect_err("program does not exist");
        assert!(matches!(err, AcquireError::MissingPrerequisite { .. }));
    }
}
