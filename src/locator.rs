//! Location of the resolution tool executable.
//!
//! When the installation-root variable is set the tool is taken from below
//! that root, so a wrapper that pins an SDK does not silently fall back to
//! whatever happens to be on the host `PATH`. Otherwise the bare tool name is
//! returned and the process launcher searches `PATH`. Nothing is checked on
//! disk here; a bad path surfaces as [`ResolveError::ToolLaunch`] when the
//! tool is invoked.
//!
//! [`ResolveError::ToolLaunch`]: crate::error::ResolveError::ToolLaunch

use crate::config::ResolverConfig;
use camino::Utf8PathBuf;
use std::env::consts::EXE_SUFFIX;

/// Resolves the tool path using the process environment.
///
/// A root variable whose value is not valid UTF-8 is treated as unset.
#[must_use]
pub fn locate_tool(config: &ResolverConfig) -> Utf8PathBuf {
    locate_tool_with(config, |name| std::env::var(name).ok())
}

/// Resolves the tool path using the supplied environment lookup.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use modresolve::config::ResolverConfig;
/// use modresolve::locator::locate_tool_with;
///
/// let config = ResolverConfig::default();
/// let tool = locate_tool_with(&config, |_| Some("/opt/go".to_owned()));
/// let expected = Utf8Path::new("/opt/go").join("bin").join("go");
/// assert_eq!(tool.as_str(), format!("{expected}{}", std::env::consts::EXE_SUFFIX));
/// ```
pub fn locate_tool_with<F>(config: &ResolverConfig, lookup: F) -> Utf8PathBuf
where
    F: FnOnce(&str) -> Option<String>,
{
    let base = match lookup(&config.root_env_var) {
        Some(root) => Utf8PathBuf::from(root)
            .join(&config.tool_subdir)
            .join(&config.tool_name),
        None => Utf8PathBuf::from(&config.tool_name),
    };

    if EXE_SUFFIX.is_empty() {
        base
    } else {
        Utf8PathBuf::from(format!("{base}{EXE_SUFFIX}"))
    }
}
