//! Error types for module resolution.
//!
//! Every variant here aborts a resolution run. Conditions that only affect a
//! single module are reported as [`crate::warning::ResolveWarning`] instead.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The manifest could not be opened or read.
    #[error("failed to read manifest {path}")]
    ManifestRead {
        /// Path of the manifest supplied by the caller.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The temporary workspace directory could not be created.
    #[error("failed to create isolated workspace")]
    WorkspaceCreate {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest copy inside the temporary workspace could not be written.
    #[error("failed to copy manifest to {path}")]
    WorkspaceCopy {
        /// Destination of the copy.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A filesystem path could not be represented as UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// The resolution tool could not be started.
    #[error("failed to launch {tool}: {source}")]
    ToolLaunch {
        /// Path of the executable that failed to start.
        tool: Utf8PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The resolution tool exited unsuccessfully.
    #[error("{operation} failed ({status}): {stderr}")]
    ToolFailed {
        /// The tool operation that failed, e.g. `go list`.
        operation: &'static str,
        /// Exit status reported by the process.
        status: ExitStatus,
        /// Diagnostics captured from standard error.
        stderr: String,
    },

    /// The resolution tool did not finish within the configured timeout.
    #[error("{operation} timed out after {} seconds", timeout.as_secs())]
    ToolTimeout {
        /// The tool operation that was terminated.
        operation: &'static str,
        /// The limit that was exceeded.
        timeout: Duration,
    },

    /// The resolution tool produced output that is not a valid record stream.
    #[error("malformed output from {operation}: {source}")]
    Decode {
        /// The tool operation whose output was malformed.
        operation: &'static str,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A configuration file could not be parsed.
    #[error("invalid configuration at {path}: {reason}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;
