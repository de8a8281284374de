//! The checksum ledger (`go.sum`).
//!
//! Each line holds `path version checksum`. Lines whose version ends in
//! [`MANIFEST_HASH_SUFFIX`] hash a module's manifest rather than its content
//! and are ignored. A missing ledger is treated as empty: recovery fills the
//! gaps.

use crate::error::Result;
use crate::index::ModuleIndex;
use crate::warning::{ResolveWarning, Warnings};
use camino::Utf8Path;
use log::debug;
use std::io::ErrorKind;

/// Version suffix marking a manifest-only hash.
pub const MANIFEST_HASH_SUFFIX: &str = "/go.mod";

/// One content checksum recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Module path.
    pub path: String,
    /// Module version.
    pub version: String,
    /// Content checksum.
    pub sum: String,
}

/// Parses raw ledger bytes into content checksum entries.
///
/// Blank lines are ignored. Lines that are not valid UTF-8 or do not hold
/// exactly three whitespace-separated fields are skipped with a
/// [`ResolveWarning::MalformedLedgerLine`]; the rest of the ledger is still
/// used.
///
/// # Examples
///
/// ```
/// use modresolve::ledger::parse_ledger;
/// use modresolve::warning::Warnings;
///
/// let text = "\
/// github.com/pkg/errors v0.9.1 h1:FEBLx1zS214owpjy7qsBeixbURkuhQAwrK5UwLGTwt4=
/// github.com/pkg/errors v0.9.1/go.mod h1:bwawxfHBFNV+L2hUp1rHADufV3IMtnDRdf1r5NINEl0=
/// ";
/// let mut warnings = Warnings::default();
/// let entries = parse_ledger(text.as_bytes(), &mut warnings);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].version, "v0.9.1");
/// assert!(warnings.is_empty());
/// ```
pub fn parse_ledger(contents: &[u8], warnings: &mut Warnings) -> Vec<LedgerEntry> {
    let mut entries = Vec::new();

    for (index, raw) in contents.split(|byte| *byte == b'\n').enumerate() {
        let Ok(line) = std::str::from_utf8(raw) else {
            warnings.push(ResolveWarning::MalformedLedgerLine { line: index + 1 });
            continue;
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [path, version, sum] = fields.as_slice() else {
            if !fields.is_empty() {
                warnings.push(ResolveWarning::MalformedLedgerLine { line: index + 1 });
            }
            continue;
        };

        if version.ends_with(MANIFEST_HASH_SUFFIX) {
            continue;
        }

        entries.push(LedgerEntry {
            path: (*path).to_owned(),
            version: (*version).to_owned(),
            sum: (*sum).to_owned(),
        });
    }

    entries
}

/// Reads and parses the ledger at `path`.
///
/// # Errors
///
/// Returns [`crate::error::ResolveError::Io`] if the file exists but cannot
/// be read. A missing file yields no entries. Undecodable content is a
/// per-line warning, never an error.
pub fn read_ledger(path: &Utf8Path, warnings: &mut Warnings) -> Result<Vec<LedgerEntry>> {
    match std::fs::read(path) {
        Ok(contents) => Ok(parse_ledger(&contents, warnings)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no checksum ledger at {path}");
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// Attaches ledger checksums to matching records and returns how many
/// records received one.
///
/// An entry matches when its path equals a record's index key and its
/// version equals the version the record resolves to. When the ledger holds
/// the same module twice, the later line wins.
pub fn merge_ledger(index: &mut ModuleIndex, entries: &[LedgerEntry]) -> usize {
    let mut merged = 0;
    for entry in entries {
        let Some(record) = index.get_mut(&entry.path) else {
            continue;
        };
        if record.resolved_version() != entry.version {
            continue;
        }
        if !record.has_sum() {
            merged += 1;
        }
        record.sum.clone_from(&entry.sum);
    }
    debug!("ledger supplied sums for {merged} of {} modules", index.len());
    merged
}
