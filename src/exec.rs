//! Subprocess execution for the resolution tool.
//!
//! [`CommandExecutor`] is the seam between resolution logic and the host
//! system. A spawned tool is exposed as a [`ToolProcess`] whose standard
//! output is read incrementally while the tool is still running; the exit
//! status and diagnostics are collected afterwards. Tests substitute a mock
//! or the `test-support` feature's `StubExecutor` so that no real tool is
//! needed.

use crate::error::{ResolveError, Result};
use camino::Utf8PathBuf;
use log::debug;
use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// A single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Short label used in errors and logs, e.g. `go list`.
    pub operation: &'static str,
    /// Executable to launch.
    pub program: Utf8PathBuf,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Working directory for the child process.
    pub dir: Utf8PathBuf,
    /// Optional limit after which the child is killed.
    pub timeout: Option<Duration>,
}

/// How a tool process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExit {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Everything the process wrote to standard error.
    pub stderr: Vec<u8>,
}

impl ToolExit {
    /// Returns the trimmed, lossily decoded standard error.
    #[must_use]
    pub fn stderr_message(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_owned()
    }
}

/// A running tool.
pub trait ToolProcess {
    /// Returns the tool's standard output.
    ///
    /// Reads fail with [`io::ErrorKind::TimedOut`] once the request's
    /// timeout has elapsed.
    fn stdout(&mut self) -> &mut dyn Read;

    /// Waits for the tool to exit and collects its diagnostics.
    ///
    /// Unread standard output is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ToolTimeout`] if the tool outlives the
    /// request's timeout, in which case it is killed, and
    /// [`ResolveError::Io`] if waiting or collecting output fails.
    fn finish(self: Box<Self>) -> Result<ToolExit>;
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Starts the request and returns a handle to the running tool.
    ///
    /// A non-zero exit status is not an error at this layer; callers inspect
    /// [`ToolExit::status`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ToolLaunch`] if the program cannot be started.
    fn spawn(&self, request: &CommandRequest) -> Result<Box<dyn ToolProcess>>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn spawn(&self, request: &CommandRequest) -> Result<Box<dyn ToolProcess>> {
        (**self).spawn(request)
    }
}

/// Executes commands on the host system.
///
/// Standard output is handed to the caller chunk by chunk as the tool
/// produces it. Standard error is forwarded to the parent's standard error
/// as it arrives and also captured for error reports. Both pipes are drained
/// on background threads so a chatty child never blocks. On Unix the tool
/// runs in its own process group, and a timeout kills the whole group.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

type PipeReader = JoinHandle<io::Result<Vec<u8>>>;

impl CommandExecutor for SystemCommandExecutor {
    fn spawn(&self, request: &CommandRequest) -> Result<Box<dyn ToolProcess>> {
        debug!(
            "running {} {} in {}",
            request.program,
            request.args.join(" "),
            request.dir
        );

        let mut command = Command::new(request.program.as_std_path());
        command
            .args(&request.args)
            .current_dir(request.dir.as_std_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command.spawn().map_err(|source| ResolveError::ToolLaunch {
            tool: request.program.clone(),
            source,
        })?;

        let deadline = request.timeout.map(|limit| Instant::now() + limit);
        let (chunks, receiver) = mpsc::channel();
        let stdout = child
            .stdout
            .take()
            .map(|pipe| thread::spawn(move || forward(pipe, &chunks)));
        let stderr = child
            .stderr
            .take()
            .map(|pipe| thread::spawn(move || drain(pipe, io::stderr())));

        Ok(Box::new(SystemProcess {
            child,
            output: ChunkReader {
                chunks: receiver,
                pending: Vec::new(),
                offset: 0,
                deadline,
                expired: false,
            },
            stdout,
            stderr,
            operation: request.operation,
            timeout: request.timeout,
            deadline,
        }))
    }
}

struct SystemProcess {
    child: Child,
    output: ChunkReader,
    stdout: Option<JoinHandle<()>>,
    stderr: Option<PipeReader>,
    operation: &'static str,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl SystemProcess {
    /// Waits for the child, returning `None` if the deadline passed first.
    fn wait(&mut self) -> io::Result<Option<ExitStatus>> {
        match self.deadline {
            Some(deadline) => self
                .child
                .wait_timeout(deadline.saturating_duration_since(Instant::now())),
            None => self.child.wait().map(Some),
        }
    }

    /// Kills the tool and everything it started, then reaps it.
    fn terminate(&mut self) {
        kill_tree(&mut self.child);
        if let Err(err) = self.child.wait() {
            debug!("failed to reap {}: {err}", self.operation);
        }
    }

    fn join_stdout(&mut self) {
        if let Some(handle) = self.stdout.take() {
            if handle.join().is_err() {
                debug!("stdout reader for {} panicked", self.operation);
            }
        }
    }
}

impl ToolProcess for SystemProcess {
    fn stdout(&mut self) -> &mut dyn Read {
        &mut self.output
    }

    fn finish(mut self: Box<Self>) -> Result<ToolExit> {
        // Disconnect so the forwarding thread discards the rest.
        self.output.chunks = mpsc::channel().1;

        let status = match self.wait() {
            Ok(Some(status)) if !self.output.expired => status,
            Ok(_) => {
                self.terminate();
                self.join_stdout();
                return Err(ResolveError::ToolTimeout {
                    operation: self.operation,
                    timeout: self.timeout.unwrap_or_default(),
                });
            }
            Err(err) => {
                self.terminate();
                self.join_stdout();
                return Err(err.into());
            }
        };

        // Stragglers left in the group would hold the pipes open.
        kill_group(&self.child);
        self.join_stdout();
        Ok(ToolExit {
            status,
            stderr: collect(self.stderr.take())?,
        })
    }
}

/// Kills the tool, and on Unix everything else in its process group.
fn kill_tree(child: &mut Child) {
    if kill_group(child) {
        return;
    }
    if let Err(err) = child.kill() {
        debug!("failed to kill child {}: {err}", child.id());
    }
}

/// Sends `SIGKILL` to the child's process group, returning `true` if a
/// member received it.
#[cfg(unix)]
fn kill_group(child: &Child) -> bool {
    let Ok(group) = libc::pid_t::try_from(child.id()) else {
        return false;
    };
    // SAFETY: `killpg` takes no pointers and only sends a signal. The child
    // was spawned as the leader of its own group, so `group` names no
    // unrelated processes.
    unsafe { libc::killpg(group, libc::SIGKILL) == 0 }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) -> bool {
    false
}

/// Standard output delivered by the forwarding thread.
struct ChunkReader {
    chunks: Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    offset: usize,
    deadline: Option<Instant>,
    /// Set once a read gave up at the deadline.
    expired: bool,
}

impl ChunkReader {
    /// Returns the next chunk, or `None` at end of stream.
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let received = match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match self.chunks.recv_timeout(remaining) {
                    Ok(chunk) => chunk,
                    Err(RecvTimeoutError::Timeout) => {
                        self.expired = true;
                        return Err(io::Error::from(io::ErrorKind::TimedOut));
                    }
                    Err(RecvTimeoutError::Disconnected) => return Ok(None),
                }
            }
            None => match self.chunks.recv() {
                Ok(chunk) => chunk,
                Err(_) => return Ok(None),
            },
        };
        received.map(Some)
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.offset >= self.pending.len() {
            let Some(chunk) = self.next_chunk()? else {
                return Ok(0);
            };
            self.pending = chunk;
            self.offset = 0;
        }
        let mut available = self.pending.get(self.offset..).unwrap_or_default();
        let read = available.read(buf)?;
        self.offset += read;
        Ok(read)
    }
}

/// Sends each chunk read from `pipe` to the reader, then keeps draining
/// once the reader has gone away so the child never blocks on a full pipe.
fn forward<R: Read>(mut pipe: R, chunks: &Sender<io::Result<Vec<u8>>>) {
    let mut buf = [0_u8; 8192];
    let mut listening = true;
    loop {
        let read = match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                if listening {
                    let _ = chunks.send(Err(err));
                }
                break;
            }
        };
        if listening {
            let chunk = buf.get(..read).unwrap_or_default().to_vec();
            listening = chunks.send(Ok(chunk)).is_ok();
        }
    }
}

/// Reads a pipe to exhaustion, copying each chunk to `tee`.
fn drain<R: Read, W: Write>(mut pipe: R, mut tee: W) -> io::Result<Vec<u8>> {
    let mut captured = Vec::new();
    let mut buf = [0_u8; 8192];
    loop {
        let read = match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        let chunk = buf.get(..read).unwrap_or_default();
        tee.write_all(chunk)?;
        captured.extend_from_slice(chunk);
    }
    Ok(captured)
}

fn collect(reader: Option<PipeReader>) -> Result<Vec<u8>> {
    let Some(handle) = reader else {
        return Ok(Vec::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| io::Error::other("pipe reader thread panicked"))??;
    Ok(bytes)
}
