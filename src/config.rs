//! Resolver configuration.
//!
//! The defaults follow the Go toolchain conventions: the manifest is
//! `go.mod`, the checksum ledger is `go.sum` beside it, and the tool lives at
//! `$GOROOT/bin/go` when `GOROOT` is set. Callers with different conventions
//! can load overrides from a TOML document.

use crate::error::{ResolveError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Settings that shape a resolution run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// File name given to the manifest copy inside the isolated workspace.
    pub manifest_name: String,
    /// File name of the checksum ledger stored beside the manifest.
    pub ledger_name: String,
    /// Environment variable naming the tool's installation root.
    pub root_env_var: String,
    /// Executable stem of the resolution tool.
    pub tool_name: String,
    /// Directory below the installation root that holds the executable.
    pub tool_subdir: String,
    /// Prefix for the temporary workspace directory name.
    pub temp_prefix: String,
    /// Optional limit, in seconds, applied to each tool invocation.
    pub timeout_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            manifest_name: "go.mod".to_owned(),
            ledger_name: "go.sum".to_owned(),
            root_env_var: "GOROOT".to_owned(),
            tool_name: "go".to_owned(),
            tool_subdir: "bin".to_owned(),
            temp_prefix: "modresolve-gomod".to_owned(),
            timeout_secs: None,
        }
    }
}

impl ResolverConfig {
    /// Parses configuration from a TOML document.
    ///
    /// Omitted keys keep their defaults; unknown keys are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use modresolve::config::ResolverConfig;
    ///
    /// let config = ResolverConfig::from_toml_str("timeout_secs = 90\n")?;
    /// assert_eq!(config.ledger_name, "go.sum");
    /// assert_eq!(config.timeout_secs, Some(90));
    /// # Ok::<(), toml::de::Error>(())
    /// ```
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Io`] if the file cannot be read and
    /// [`ResolveError::InvalidConfig`] if it cannot be parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|err| ResolveError::InvalidConfig {
            path: path.to_owned(),
            reason: err.message().to_owned(),
        })
    }

    /// Returns the per-invocation timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the checksum ledger path for the given manifest.
    #[must_use]
    pub fn ledger_path(&self, manifest: &Utf8Path) -> Utf8PathBuf {
        manifest
            .parent()
            .map_or_else(|| Utf8PathBuf::from(&self.ledger_name), |dir| {
                dir.join(&self.ledger_name)
            })
    }
}
