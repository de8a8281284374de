//! Output descriptors handed to the build-file generator.

use crate::index::{ModuleIndex, ModuleRecord};
use crate::naming::NameFn;
use crate::warning::{ResolveWarning, Warnings};
use log::debug;

/// One resolved external module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Repository name derived from [`Self::import_path`].
    pub name: String,
    /// Declared import path of the module.
    pub import_path: String,
    /// Version to fetch; the override's version for replaced modules.
    pub version: String,
    /// Content checksum, never empty.
    pub sum: String,
    /// Import path that fetches are redirected to, for replaced modules.
    pub replace: Option<String>,
}

impl ModuleDescriptor {
    fn from_record(record: ModuleRecord, namer: NameFn) -> Self {
        let name = namer(&record.path);
        let (version, replace) = match record.replace {
            Some(target) => (target.version, Some(target.path)),
            None => (record.version, None),
        };
        Self {
            name,
            import_path: record.path,
            version,
            sum: record.sum,
            replace,
        }
    }
}

/// Converts the index into descriptors sorted strictly ascending by name.
///
/// Records without a sum are dropped with a
/// [`ResolveWarning::MissingChecksum`]. When two import paths derive the
/// same name, the lexicographically smaller path is kept and the other is
/// reported as a [`ResolveWarning::NameCollision`].
pub fn build_descriptors(
    index: ModuleIndex,
    namer: NameFn,
    warnings: &mut Warnings,
) -> Vec<ModuleDescriptor> {
    let mut candidates: Vec<ModuleDescriptor> = index
        .into_iter()
        .filter_map(|record| {
            if record.has_sum() {
                Some(ModuleDescriptor::from_record(record, namer))
            } else {
                warnings.push(ResolveWarning::MissingChecksum { path: record.path });
                None
            }
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.import_path.cmp(&b.import_path))
    });

    let mut descriptors: Vec<ModuleDescriptor> = Vec::with_capacity(candidates.len());
    for descriptor in candidates {
        if let Some(previous) = descriptors.last() {
            if previous.name == descriptor.name {
                warnings.push(ResolveWarning::NameCollision {
                    name: descriptor.name,
                    kept: previous.import_path.clone(),
                    discarded: descriptor.import_path,
                });
                continue;
            }
        }
        descriptors.push(descriptor);
    }

    debug!("built {} module descriptors", descriptors.len());
    descriptors
}
