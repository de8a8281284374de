//! Non-fatal conditions recorded during a resolution run.
//!
//! A warning never aborts resolution. The affected module is skipped and the
//! warning is attached to the otherwise successful
//! [`Resolution`](crate::resolver::Resolution).

use log::warn;
use thiserror::Error;

/// A partial-data condition encountered while resolving modules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveWarning {
    /// A module is replaced by a local directory, which cannot be fetched.
    #[error("file path replacements are not supported: {path} -> {target}")]
    LocalReplacement {
        /// Declared module path.
        path: String,
        /// Local replacement target.
        target: String,
    },

    /// Two modules resolve to the same import path.
    #[error("modules {kept} and {discarded} both resolve to {key}; keeping {kept}")]
    PathCollision {
        /// The contested import path.
        key: String,
        /// Declared path of the module that was kept.
        kept: String,
        /// Declared path of the module that was dropped.
        discarded: String,
    },

    /// A checksum ledger line did not have exactly three fields.
    #[error("ignoring malformed checksum ledger line {line}")]
    MalformedLedgerLine {
        /// One-based line number.
        line: usize,
    },

    /// The tool reported an error while downloading a module.
    #[error("download of {module} failed: {message}")]
    DownloadFailed {
        /// Version-qualified module identifier.
        module: String,
        /// Error reported by the tool.
        message: String,
    },

    /// No checksum could be found or recovered for a module.
    #[error("could not determine sum for module {path}")]
    MissingChecksum {
        /// Declared module path.
        path: String,
    },

    /// Two distinct import paths derive the same repository name.
    #[error("modules {kept} and {discarded} both map to name {name}; keeping {kept}")]
    NameCollision {
        /// The shared derived name.
        name: String,
        /// Import path that was kept.
        kept: String,
        /// Import path that was dropped.
        discarded: String,
    },
}

/// Accumulates warnings for one resolution run, logging each as it arrives.
#[derive(Debug, Default)]
pub struct Warnings {
    recorded: Vec<ResolveWarning>,
}

impl Warnings {
    /// Records a warning and emits it through the `log` facade.
    pub fn push(&mut self, warning: ResolveWarning) {
        warn!("{warning}");
        self.recorded.push(warning);
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }

    /// Consumes the collector and returns the recorded warnings in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<ResolveWarning> {
        self.recorded
    }
}
