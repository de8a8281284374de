//! The resolution pipeline.
//!
//! A run isolates the manifest, lists the module graph, merges the checksum
//! ledger, recovers missing checksums, and builds sorted descriptors. Stages
//! run strictly in sequence on one thread; the module index lives only for
//! the duration of the run.

use crate::authority::{GoAuthority, ModuleAuthority};
use crate::config::ResolverConfig;
use crate::descriptor::{ModuleDescriptor, build_descriptors};
use crate::error::Result;
use crate::exec::SystemCommandExecutor;
use crate::index::fetch_module_graph;
use crate::ledger::{merge_ledger, read_ledger};
use crate::naming::{NameFn, import_path_to_repo_name};
use crate::recovery::recover_sums;
use crate::warning::{ResolveWarning, Warnings};
use crate::workspace::IsolatedWorkspace;
use camino::Utf8Path;
use log::{debug, warn};

/// The outcome of a successful resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved modules, sorted strictly ascending by name.
    pub descriptors: Vec<ModuleDescriptor>,
    /// Non-fatal conditions encountered during the run.
    pub warnings: Vec<ResolveWarning>,
}

impl Resolution {
    /// Returns `true` if the run produced no warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Resolves manifests against a [`ModuleAuthority`].
#[derive(Debug, Clone)]
pub struct Resolver<A> {
    authority: A,
    config: ResolverConfig,
    namer: NameFn,
}

impl<A: ModuleAuthority> Resolver<A> {
    /// Creates a resolver with default configuration and naming.
    pub fn new(authority: A) -> Self {
        Self {
            authority,
            config: ResolverConfig::default(),
            namer: import_path_to_repo_name,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the naming scheme.
    #[must_use]
    pub fn with_namer(mut self, namer: NameFn) -> Self {
        self.namer = namer;
        self
    }

    /// Resolves every module required by `manifest`.
    ///
    /// The manifest is only ever read. The authority runs against a private
    /// copy in a temporary directory that is removed before this returns,
    /// whether resolution succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns I/O errors for an unreadable manifest or workspace, and
    /// process or decode errors from the authority. Modules that merely lack
    /// data are reported in [`Resolution::warnings`] instead.
    pub fn resolve(&self, manifest: &Utf8Path) -> Result<Resolution> {
        let workspace = IsolatedWorkspace::create(manifest, &self.config)?;
        debug!("resolving {manifest} in {}", workspace.path());

        let outcome = self.resolve_in(manifest, &workspace);

        let path = workspace.path().to_owned();
        if let Err(err) = workspace.close() {
            warn!("failed to remove workspace {path}: {err}");
        }
        outcome
    }

    fn resolve_in(&self, manifest: &Utf8Path, workspace: &IsolatedWorkspace) -> Result<Resolution> {
        let mut warnings = Warnings::default();

        let mut index = fetch_module_graph(&self.authority, workspace.path(), &mut warnings)?;
        let entries = read_ledger(&self.config.ledger_path(manifest), &mut warnings)?;
        merge_ledger(&mut index, &entries);
        recover_sums(&self.authority, workspace.path(), &mut index, &mut warnings)?;
        let descriptors = build_descriptors(index, self.namer, &mut warnings);

        Ok(Resolution {
            descriptors,
            warnings: warnings.into_vec(),
        })
    }
}

/// Resolves `manifest` with the Go tool found through the environment.
///
/// # Errors
///
/// As for [`Resolver::resolve`].
pub fn resolve_modules(manifest: &Utf8Path) -> Result<Resolution> {
    resolve_modules_with(manifest, ResolverConfig::default())
}

/// Resolves `manifest` with the Go tool, using the given configuration.
///
/// # Errors
///
/// As for [`Resolver::resolve`].
pub fn resolve_modules_with(manifest: &Utf8Path, config: ResolverConfig) -> Result<Resolution> {
    let authority = GoAuthority::new(SystemCommandExecutor, &config);
    Resolver::new(authority).with_config(config).resolve(manifest)
}
