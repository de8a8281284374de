//! Shared test utilities for resolver tests.

use crate::error::{ResolveError, Result};
use crate::exec::{CommandExecutor, CommandRequest, ToolExit, ToolProcess};
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` whose stdout is `stdout`.
#[must_use]
pub fn json_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// A finished process replaying a recorded `Output`.
#[derive(Debug)]
pub struct CannedProcess {
    stdout: Cursor<Vec<u8>>,
    exit: ToolExit,
}

impl CannedProcess {
    /// Wraps `output` as a process that has already exited.
    #[must_use]
    pub fn new(output: Output) -> Self {
        Self {
            stdout: Cursor::new(output.stdout),
            exit: ToolExit {
                status: output.status,
                stderr: output.stderr,
            },
        }
    }
}

impl ToolProcess for CannedProcess {
    fn stdout(&mut self) -> &mut dyn Read {
        &mut self.stdout
    }

    fn finish(self: Box<Self>) -> Result<ToolExit> {
        Ok(self.exit)
    }
}

/// Boxes `output` as a [`ToolProcess`] for executor doubles.
#[must_use]
pub fn canned(output: Output) -> Box<dyn ToolProcess> {
    Box::new(CannedProcess::new(output))
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The operation label the request must carry, e.g. `go list`.
    pub operation: &'static str,
    /// The arguments the request must carry.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Creates an expectation from borrowed argument strings.
    #[must_use]
    pub fn new(operation: &'static str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            operation,
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Returns predefined results for an ordered list of expected invocations
/// and remembers the working directory of every request it receives.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    dirs: RefCell<Vec<Utf8PathBuf>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            dirs: RefCell::new(Vec::new()),
        }
    }

    /// Returns the working directories seen so far, in call order.
    #[must_use]
    pub fn seen_dirs(&self) -> Vec<Utf8PathBuf> {
        self.dirs.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn spawn(&self, request: &CommandRequest) -> Result<Box<dyn ToolProcess>> {
        self.dirs.borrow_mut().push(request.dir.clone());

        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ResolveError::StubMismatch {
                message: format!("unexpected invocation of {}", request.operation),
            })?;

        if call.operation != request.operation || call.args != request.args {
            return Err(ResolveError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {} {:?}",
                    call.operation, call.args, request.operation, request.args
                ),
            });
        }

        call.result.map(canned)
    }
}
