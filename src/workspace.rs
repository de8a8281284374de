//! Isolated workspaces for running the resolution tool.
//!
//! `go list` may rewrite the manifest it runs against. The caller's manifest
//! is therefore copied into a fresh temporary directory and the tool only
//! ever sees the copy. The directory is removed when the
//! [`IsolatedWorkspace`] is closed or dropped, on every exit path.

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use tempfile::TempDir;

/// A private temporary directory holding a copy of the manifest.
#[derive(Debug)]
pub struct IsolatedWorkspace {
    dir: TempDir,
    path: Utf8PathBuf,
    manifest: Utf8PathBuf,
}

impl IsolatedWorkspace {
    /// Creates a workspace containing an unchanged copy of `manifest`.
    ///
    /// The original is opened read-only. The copy is named after
    /// [`ResolverConfig::manifest_name`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ManifestRead`] if the manifest cannot be
    /// opened, [`ResolveError::WorkspaceCreate`] if the directory cannot be
    /// created, and [`ResolveError::WorkspaceCopy`] if the copy fails.
    pub fn create(manifest: &Utf8Path, config: &ResolverConfig) -> Result<Self> {
        let mut original = File::open(manifest).map_err(|source| ResolveError::ManifestRead {
            path: manifest.to_owned(),
            source,
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&config.temp_prefix)
            .tempdir()
            .map_err(|source| ResolveError::WorkspaceCreate { source })?;
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).map_err(|err| {
            ResolveError::NonUtf8Path {
                path: err.into_path_buf(),
            }
        })?;

        let copy_path = path.join(&config.manifest_name);
        let copy_error = |source| ResolveError::WorkspaceCopy {
            path: copy_path.clone(),
            source,
        };
        let mut copy = File::create(&copy_path).map_err(copy_error)?;
        std::io::copy(&mut original, &mut copy).map_err(copy_error)?;
        copy.sync_all().map_err(copy_error)?;

        Ok(Self {
            dir,
            path,
            manifest: copy_path,
        })
    }

    /// Returns the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the path of the manifest copy.
    #[must_use]
    pub fn manifest(&self) -> &Utf8Path {
        &self.manifest
    }

    /// Removes the workspace, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Io`] if the directory cannot be removed.
    pub fn close(self) -> Result<()> {
        self.dir.close().map_err(ResolveError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const MANIFEST: &str = "module example.com/app\n\ngo 1.21\n\nrequire example.com/a v1.0.0\n";

    /// A directory holding a manifest that must never change.
    struct Project {
        _temp: TempDir,
        manifest: Utf8PathBuf,
    }

    #[fixture]
    fn project() -> Project {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
        let manifest = root.join("go.mod");
        std::fs::write(&manifest, MANIFEST).expect("failed to write go.mod");
        Project {
            _temp: temp,
            manifest,
        }
    }

    #[rstest]
    fn copies_manifest_into_fresh_directory(project: Project) {
        let workspace = IsolatedWorkspace::create(&project.manifest, &ResolverConfig::default())
            .expect("workspace created");

        assert_ne!(Some(workspace.path()), project.manifest.parent());
        assert_eq!(
            workspace.manifest(),
            workspace.path().join("go.mod").as_path()
        );
        let copied = std::fs::read_to_string(workspace.manifest()).expect("copy readable");
        assert_eq!(copied, MANIFEST);
    }

    #[rstest]
    fn writes_to_copy_leave_original_alone(project: Project) {
        let workspace = IsolatedWorkspace::create(&project.manifest, &ResolverConfig::default())
            .expect("workspace created");

        std::fs::write(workspace.manifest(), "module rewritten\n").expect("rewrite copy");

        let original = std::fs::read_to_string(&project.manifest).expect("original readable");
        assert_eq!(original, MANIFEST);
    }

    #[rstest]
    fn directory_is_removed_on_close(project: Project) {
        let workspace = IsolatedWorkspace::create(&project.manifest, &ResolverConfig::default())
            .expect("workspace created");
        let path = workspace.path().to_owned();

        workspace.close().expect("workspace removed");
        assert!(!path.exists());
    }

    #[rstest]
    fn directory_is_removed_on_drop(project: Project) {
        let path = {
            let workspace =
                IsolatedWorkspace::create(&project.manifest, &ResolverConfig::default())
                    .expect("workspace created");
            workspace.path().to_owned()
        };
        assert!(!path.exists());
    }

    #[rstest]
    fn each_workspace_is_unique(project: Project) {
        let config = ResolverConfig::default();
        let first = IsolatedWorkspace::create(&project.manifest, &config).expect("first");
        let second = IsolatedWorkspace::create(&project.manifest, &config).expect("second");
        assert_ne!(first.path(), second.path());
    }

    #[rstest]
    fn uses_configured_names(project: Project) {
        let config = ResolverConfig {
            manifest_name: "deps.mod".to_owned(),
            temp_prefix: "custom-prefix".to_owned(),
            ..ResolverConfig::default()
        };
        let workspace = IsolatedWorkspace::create(&project.manifest, &config).expect("workspace");

        assert!(workspace.manifest().ends_with("deps.mod"));
        assert!(
            workspace
                .path()
                .file_name()
                .is_some_and(|name| name.starts_with("custom-prefix"))
        );
    }

    #[test]
    fn missing_manifest_is_manifest_read_error() {
        let result = IsolatedWorkspace::create(
            Utf8Path::new("/nonexistent/modresolve/go.mod"),
            &ResolverConfig::default(),
        );
        match result {
            Err(ResolveError::ManifestRead { path, .. }) => {
                assert_eq!(path, "/nonexistent/modresolve/go.mod");
            }
            other => panic!("expected manifest read error, got {other:?}"),
        }
    }
}
