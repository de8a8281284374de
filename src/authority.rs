//! The module resolution authority.
//!
//! Graph construction and checksum downloads are delegated to an external
//! authority, normally the Go tool. [`ModuleAuthority`] is the injected
//! strategy; [`GoAuthority`] implements it over a [`CommandExecutor`].

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::exec::{CommandExecutor, CommandRequest};
use crate::locator::locate_tool;
use crate::stream::JsonStream;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Operation label for listing the module graph.
pub const LIST_OPERATION: &str = "go list";

/// Operation label for downloading module checksums.
pub const DOWNLOAD_OPERATION: &str = "go mod download";

/// A module reported by the graph listing.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListedModule {
    /// Declared module path.
    pub path: String,
    /// Selected version.
    pub version: String,
    /// Whether this is the main module of the manifest.
    pub main: bool,
    /// Replacement directive applied to the module, if any.
    pub replace: Option<Replacement>,
}

/// A replacement target for an overridden module.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct Replacement {
    /// Target module path or local directory.
    pub path: String,
    /// Target version; empty for local directories.
    pub version: String,
}

/// A module reported by the download mode.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct DownloadedModule {
    /// Module path as requested.
    pub path: String,
    /// Module version as requested.
    pub version: String,
    /// Content checksum; empty when the download failed.
    pub sum: String,
    /// Error reported for this module, if any.
    pub error: Option<String>,
}

/// A version-qualified module identifier, rendered as `path@version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModuleVersion {
    /// Module path.
    pub path: String,
    /// Module version.
    pub version: String,
}

impl ModuleVersion {
    /// Creates an identifier from its parts.
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.version)
    }
}

/// Computes module graphs and fetches module checksums.
#[cfg_attr(test, mockall::automock)]
pub trait ModuleAuthority {
    /// Lists every module reachable from the manifest in `workspace`,
    /// including the main module.
    ///
    /// # Errors
    ///
    /// Returns a process error if the authority cannot run or fails, and
    /// [`ResolveError::Decode`] if its output is malformed.
    fn list_modules(&self, workspace: &Utf8Path) -> Result<Vec<ListedModule>>;

    /// Downloads the given modules in one batch and reports their checksums.
    ///
    /// # Errors
    ///
    /// As for [`ModuleAuthority::list_modules`].
    fn download_checksums(
        &self,
        workspace: &Utf8Path,
        targets: &[ModuleVersion],
    ) -> Result<Vec<DownloadedModule>>;
}

impl<A: ModuleAuthority + ?Sized> ModuleAuthority for &A {
    fn list_modules(&self, workspace: &Utf8Path) -> Result<Vec<ListedModule>> {
        (**self).list_modules(workspace)
    }

    fn download_checksums(
        &self,
        workspace: &Utf8Path,
        targets: &[ModuleVersion],
    ) -> Result<Vec<DownloadedModule>> {
        (**self).download_checksums(workspace, targets)
    }
}

/// The Go tool as a [`ModuleAuthority`].
#[derive(Debug, Clone)]
pub struct GoAuthority<E> {
    executor: E,
    tool: Utf8PathBuf,
    timeout: Option<Duration>,
}

impl<E: CommandExecutor> GoAuthority<E> {
    /// Creates an authority whose tool is located from `config` and the
    /// process environment.
    pub fn new(executor: E, config: &ResolverConfig) -> Self {
        Self {
            executor,
            tool: locate_tool(config),
            timeout: config.timeout(),
        }
    }

    /// Creates an authority that runs the given executable.
    pub fn with_tool(executor: E, tool: impl Into<Utf8PathBuf>) -> Self {
        Self {
            executor,
            tool: tool.into(),
            timeout: None,
        }
    }

    /// Sets the per-invocation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the executable this authority runs.
    #[must_use]
    pub fn tool(&self) -> &Utf8Path {
        &self.tool
    }

    /// Runs the tool and decodes its records while it is still writing them.
    ///
    /// A non-zero exit takes precedence over a decode error.
    fn invoke<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        args: Vec<String>,
        workspace: &Utf8Path,
    ) -> Result<Vec<T>> {
        let request = CommandRequest {
            operation,
            program: self.tool.clone(),
            args,
            dir: workspace.to_owned(),
            timeout: self.timeout,
        };
        let mut process = self.executor.spawn(&request)?;
        let records: Result<Vec<T>> = JsonStream::new(process.stdout(), operation).collect();
        let exit = process.finish()?;

        if !exit.status.success() {
            return Err(ResolveError::ToolFailed {
                operation,
                status: exit.status,
                stderr: exit.stderr_message(),
            });
        }

        records
    }
}

impl<E: CommandExecutor> ModuleAuthority for GoAuthority<E> {
    fn list_modules(&self, workspace: &Utf8Path) -> Result<Vec<ListedModule>> {
        let args = ["list", "-m", "-json", "all"].map(str::to_owned).to_vec();
        self.invoke(LIST_OPERATION, args, workspace)
    }

    fn download_checksums(
        &self,
        workspace: &Utf8Path,
        targets: &[ModuleVersion],
    ) -> Result<Vec<DownloadedModule>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        debug!("downloading {} modules for missing sums", targets.len());
        let mut args = ["mod", "download", "-json"].map(str::to_owned).to_vec();
        args.extend(targets.iter().map(ToString::to_string));

        self.invoke(DOWNLOAD_OPERATION, args, workspace)
    }
}

#[cfg(test)]
mod tests;
