//! Go module dependency resolution.
//!
//! This crate resolves the full external module graph of a Go project into
//! sorted repository descriptors, each carrying a name, import path, version,
//! content checksum, and optional redirect. The Go toolchain is the authority
//! for the graph; the project's checksum ledger is consulted first and any
//! checksums it lacks are recovered with a single batched download. The
//! project directory is never modified: all tool invocations run against a
//! copy of the manifest in a private temporary directory.
//!
//! # Modules
//!
//! - [`authority`] - Module graph queries against the Go tool
//! - [`config`] - Resolver configuration and TOML loading
//! - [`descriptor`] - Sorted output descriptors
//! - [`error`] - Fatal error types
//! - [`exec`] - Subprocess execution with timeouts
//! - [`index`] - The module index keyed by effective import path
//! - [`ledger`] - Checksum ledger parsing and merging
//! - [`locator`] - Go tool discovery
//! - [`naming`] - Repository naming for import paths
//! - [`recovery`] - Batched checksum recovery
//! - [`resolver`] - The end-to-end resolution pipeline
//! - [`stream`] - Incremental decoding of concatenated JSON values
//! - [`warning`] - Non-fatal conditions reported alongside results
//! - [`workspace`] - Isolated manifest copies
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//!
//! let resolution = modresolve::resolve_modules(Utf8Path::new("go.mod"))?;
//! for descriptor in &resolution.descriptors {
//!     println!("{} {} {}", descriptor.name, descriptor.version, descriptor.sum);
//! }
//! # Ok::<(), modresolve::ResolveError>(())
//! ```

pub mod authority;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod exec;
pub mod index;
pub mod ledger;
pub mod locator;
pub mod naming;
pub mod recovery;
pub mod resolver;
pub mod stream;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod warning;
pub mod workspace;

pub use config::ResolverConfig;
pub use descriptor::ModuleDescriptor;
pub use error::{ResolveError, Result};
pub use resolver::{Resolution, Resolver, resolve_modules, resolve_modules_with};
pub use warning::ResolveWarning;
