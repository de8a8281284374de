//! Repository naming for resolved modules.

/// Signature of a naming scheme: maps an import path to a repository name.
pub type NameFn = fn(&str) -> String;

/// Derives a repository name from an import path.
///
/// The host's dot-separated labels are reversed, the remaining path
/// components are appended, and everything is joined with underscores.
/// Hyphens and dots become underscores and the result is lowercase.
///
/// # Examples
///
/// ```
/// use modresolve::naming::import_path_to_repo_name;
///
/// assert_eq!(
///     import_path_to_repo_name("github.com/pkg/errors"),
///     "com_github_pkg_errors"
/// );
/// assert_eq!(
///     import_path_to_repo_name("gopkg.in/yaml.v2"),
///     "in_gopkg_yaml_v2"
/// );
/// ```
#[must_use]
pub fn import_path_to_repo_name(import_path: &str) -> String {
    let lowered = import_path.to_lowercase();
    let mut components = lowered.split('/');
    let host = components.next().unwrap_or_default();

    let mut parts: Vec<&str> = host.split('.').rev().collect();
    parts.extend(components);
    parts.join("_").replace(['-', '.'], "_")
}
