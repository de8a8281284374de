//! The per-run module table.
//!
//! Records are keyed by the import path that code actually resolves to: the
//! replacement target for overridden modules, the declared path otherwise.
//! The table is owned by a single resolution run and threaded through each
//! stage by `&mut`.

use crate::authority::{ListedModule, ModuleAuthority, ModuleVersion, Replacement};
use crate::error::Result;
use crate::warning::{ResolveWarning, Warnings};
use camino::Utf8Path;
use log::debug;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// A module being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Declared module path.
    pub path: String,
    /// Declared version.
    pub version: String,
    /// Content checksum; empty until the ledger or a download supplies one.
    pub sum: String,
    /// Replacement directive, if the module is overridden.
    pub replace: Option<Replacement>,
}

impl ModuleRecord {
    /// Returns the path imports resolve to.
    #[must_use]
    pub fn key(&self) -> &str {
        self.replace
            .as_ref()
            .map_or(self.path.as_str(), |replace| replace.path.as_str())
    }

    /// Returns the version whose content is actually fetched.
    #[must_use]
    pub fn resolved_version(&self) -> &str {
        self.replace
            .as_ref()
            .map_or(self.version.as_str(), |replace| replace.version.as_str())
    }

    /// Returns the identifier used to download this module.
    #[must_use]
    pub fn download_target(&self) -> ModuleVersion {
        ModuleVersion::new(self.key(), self.resolved_version())
    }

    /// Returns `true` once a checksum is known.
    #[must_use]
    pub fn has_sum(&self) -> bool {
        !self.sum.is_empty()
    }
}

impl From<ListedModule> for ModuleRecord {
    fn from(module: ListedModule) -> Self {
        Self {
            path: module.path,
            version: module.version,
            sum: String::new(),
            replace: module.replace,
        }
    }
}

/// Modules keyed by resolved import path, at most one per path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleIndex {
    records: BTreeMap<String, ModuleRecord>,
}

impl ModuleIndex {
    /// Builds an index from a graph listing.
    ///
    /// The main module is dropped, local-path replacements are skipped with a
    /// warning, and a second record for an already indexed path is discarded
    /// with a [`ResolveWarning::PathCollision`].
    pub fn from_listing<I>(modules: I, warnings: &mut Warnings) -> Self
    where
        I: IntoIterator<Item = ListedModule>,
    {
        let mut index = Self::default();
        for module in modules {
            index.insert(module, warnings);
        }
        index
    }

    /// Adds one listed module, applying the indexing rules above.
    pub fn insert(&mut self, module: ListedModule, warnings: &mut Warnings) {
        if module.main {
            debug!("skipping main module {}", module.path);
            return;
        }

        if let Some(replace) = &module.replace {
            if is_local_path(&replace.path) {
                warnings.push(ResolveWarning::LocalReplacement {
                    path: module.path,
                    target: replace.path.clone(),
                });
                return;
            }
        }

        let record = ModuleRecord::from(module);
        match self.records.entry(record.key().to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(existing) => {
                warnings.push(ResolveWarning::PathCollision {
                    key: existing.key().clone(),
                    kept: existing.get().path.clone(),
                    discarded: record.path,
                });
            }
        }
    }

    /// Returns the record indexed under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModuleRecord> {
        self.records.get(key)
    }

    /// Returns a mutable reference to the record indexed under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ModuleRecord> {
        self.records.get_mut(key)
    }

    /// Iterates over records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records.values()
    }

    /// Returns the number of indexed modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no modules are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the download identifiers of every record still missing a sum.
    #[must_use]
    pub fn missing_sums(&self) -> Vec<ModuleVersion> {
        self.iter()
            .filter(|record| !record.has_sum())
            .map(ModuleRecord::download_target)
            .collect()
    }
}

impl IntoIterator for ModuleIndex {
    type Item = ModuleRecord;
    type IntoIter = std::collections::btree_map::IntoValues<String, ModuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

/// Lists the module graph of `workspace` and indexes it.
///
/// # Errors
///
/// Propagates process and decode errors from the authority.
pub fn fetch_module_graph<A>(
    authority: &A,
    workspace: &Utf8Path,
    warnings: &mut Warnings,
) -> Result<ModuleIndex>
where
    A: ModuleAuthority + ?Sized,
{
    let modules = authority.list_modules(workspace)?;
    debug!("authority listed {} modules", modules.len());
    Ok(ModuleIndex::from_listing(modules, warnings))
}

/// Returns `true` for replacement targets that name a directory rather than
/// a module: absolute filesystem paths and `.`/`..`-relative imports.
#[must_use]
pub fn is_local_path(target: &str) -> bool {
    Utf8Path::new(target).is_absolute() || is_local_import(target)
}

fn is_local_import(target: &str) -> bool {
    target == "."
        || target == ".."
        || target.starts_with("./")
        || target.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn listed(path: &str, version: &str) -> ListedModule {
        ListedModule {
            path: path.to_owned(),
            version: version.to_owned(),
            ..ListedModule::default()
        }
    }

    fn replaced(path: &str, target: &str, target_version: &str) -> ListedModule {
        ListedModule {
            replace: Some(Replacement {
                path: target.to_owned(),
                version: target_version.to_owned(),
            }),
            ..listed(path, "v1.0.0")
        }
    }

    #[test]
    fn main_module_is_discarded() {
        let mut warnings = Warnings::default();
        let main = ListedModule {
            main: true,
            ..listed("example.com/app", "")
        };
        let index = ModuleIndex::from_listing(
            vec![main, listed("example.com/a", "v1.0.0")],
            &mut warnings,
        );

        assert_eq!(index.len(), 1);
        assert!(index.get("example.com/app").is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn override_is_indexed_under_target_path() {
        let mut warnings = Warnings::default();
        let index = ModuleIndex::from_listing(
            vec![replaced("example.com/c", "example.com/d", "v2.0.0")],
            &mut warnings,
        );

        assert!(index.get("example.com/c").is_none());
        let record = index.get("example.com/d").expect("indexed under target");
        assert_eq!(record.path, "example.com/c");
        assert_eq!(record.resolved_version(), "v2.0.0");
        assert_eq!(
            record.download_target(),
            ModuleVersion::new("example.com/d", "v2.0.0")
        );
    }

    #[rstest]
    #[case("../fork")]
    #[case("./vendor/a")]
    #[case(".")]
    #[case("..")]
    fn local_replacements_are_skipped(#[case] target: &str) {
        let mut warnings = Warnings::default();
        let index =
            ModuleIndex::from_listing(vec![replaced("example.com/a", target, "")], &mut warnings);

        assert!(index.is_empty());
        assert_eq!(
            warnings.into_vec(),
            vec![ResolveWarning::LocalReplacement {
                path: "example.com/a".to_owned(),
                target: target.to_owned(),
            }]
        );
    }

    #[cfg(unix)]
    #[test]
    fn absolute_replacement_is_local() {
        assert!(is_local_path("/src/fork"));
    }

    #[rstest]
    #[case("example.com/fork", false)]
    #[case("github.com/a/b", false)]
    #[case("..foo", false)]
    #[case("../foo", true)]
    fn local_path_detection(#[case] target: &str, #[case] expected: bool) {
        assert_eq!(is_local_path(target), expected);
    }

    #[test]
    fn colliding_override_keeps_first_record() {
        let mut warnings = Warnings::default();
        let index = ModuleIndex::from_listing(
            vec![
                listed("example.com/d", "v1.5.0"),
                replaced("example.com/c", "example.com/d", "v2.0.0"),
            ],
            &mut warnings,
        );

        assert_eq!(index.len(), 1);
        let kept = index.get("example.com/d").expect("collision keeps one record");
        assert_eq!(kept.path, "example.com/d");
        assert!(kept.replace.is_none());
        assert_eq!(
            warnings.into_vec(),
            vec![ResolveWarning::PathCollision {
                key: "example.com/d".to_owned(),
                kept: "example.com/d".to_owned(),
                discarded: "example.com/c".to_owned(),
            }]
        );
    }

    #[test]
    fn missing_sums_lists_only_unsummed_records() {
        let mut warnings = Warnings::default();
        let mut index = ModuleIndex::from_listing(
            vec![
                listed("example.com/a", "v1.0.0"),
                listed("example.com/b", "v0.2.0"),
                replaced("example.com/c", "example.com/d", "v2.0.0"),
            ],
            &mut warnings,
        );
        if let Some(record) = index.get_mut("example.com/a") {
            record.sum = "h1:aaa=".to_owned();
        }

        assert_eq!(
            index.missing_sums(),
            vec![
                ModuleVersion::new("example.com/b", "v0.2.0"),
                ModuleVersion::new("example.com/d", "v2.0.0"),
            ]
        );
    }
}
