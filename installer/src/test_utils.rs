//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour tests under `tests/`.

use crate::artefact::download::{DownloadError, FetchResponse, HttpClient};
use crate::error::{AcquireError, Result};
use crate::executor::CommandExecutor;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` carrying `stdout`.
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "make").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Build an expectation from borrowed parts.
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Returns predefined results for an exact, ordered sequence of invocations.
/// An unexpected or mismatched invocation is reported as
/// [`AcquireError::StubMismatch`] so the failure surfaces through the code
/// under test.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} left: {remaining:?}",
            remaining.len()
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str], _cwd: &Path) -> Result<Output> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(AcquireError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            });
        };
        if call.cmd != cmd || call.args != args {
            return Err(AcquireError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }
        call.result
    }
}

/// A command invocation captured by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The program name.
    pub cmd: String,
    /// The arguments, in order.
    pub args: Vec<String>,
    /// The working directory.
    pub cwd: PathBuf,
}

impl RecordedCall {
    /// The command line joined with single spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.cmd.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A side effect run when a matching command is recorded.
type Effect = Box<dyn Fn(&RecordedCall)>;

/// An executor that records every invocation and succeeds.
///
/// Individual commands can be made to fail by naming a substring of their
/// command line with [`RecordingExecutor::fail_on`], or can touch the
/// filesystem the way the real tool would with
/// [`RecordingExecutor::with_effect`].
#[derive(Default)]
pub struct RecordingExecutor {
    calls: RefCell<Vec<RecordedCall>>,
    failures: Vec<(String, String)>,
    effects: Vec<(String, Effect)>,
}

impl std::fmt::Debug for RecordingExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingExecutor")
            .field("calls", &self.calls)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl RecordingExecutor {
    /// An executor on which every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any command whose command line contains `needle`.
    #[must_use]
    pub fn fail_on(mut self, needle: &str, stderr: &str) -> Self {
        self.failures.push((needle.to_owned(), stderr.to_owned()));
        self
    }

    /// Run `effect` whenever a command line containing `needle` is recorded.
    #[must_use]
    pub fn with_effect(mut self, needle: &str, effect: impl Fn(&RecordedCall) + 'static) -> Self {
        self.effects.push((needle.to_owned(), Box::new(effect)));
        self
    }

    /// All invocations so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Command lines of all invocations so far.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(RecordedCall::command_line).collect()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> Result<Output> {
        let call = RecordedCall {
            cmd: cmd.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            cwd: cwd.to_path_buf(),
        };
        let line = call.command_line();
        self.effects
            .iter()
            .filter(|(needle, _)| line.contains(needle.as_str()))
            .for_each(|(_, effect)| effect(&call));
        self.calls.borrow_mut().push(call);
        let failure = self
            .failures
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()));
        Ok(failure.map_or_else(success_output, |(_, stderr)| failure_output(stderr)))
    }
}

/// An in-memory HTTP client serving fixed bodies by URL.
///
/// Unknown URLs answer with [`DownloadError::NotFound`]. Every request is
/// recorded, including failed ones.
#[derive(Debug, Default)]
pub struct StubHttpClient {
    bodies: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubHttpClient {
    /// A client that knows no URLs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    #[must_use]
    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_owned(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl HttpClient for StubHttpClient {
    fn get(&self, url: &str) -> std::result::Result<FetchResponse, DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        self.bodies
            .get(url)
            .map(|body| FetchResponse::from_bytes(body.clone()))
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_owned(),
            })
    }
}

/// Build an in-memory `.tar.gz` from `(path, contents)` pairs.
///
/// # Panics
///
/// Panics if the archive cannot be assembled in memory.
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *data)
            .expect("append entry to in-memory tar");
    }
    builder
        .into_inner()
        .and_then(flate2::write::GzEncoder::finish)
        .expect("finish in-memory tar.gz")
}
