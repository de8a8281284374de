//! Recovery of checksums the ledger did not supply.
//!
//! Every module still lacking a sum is downloaded in a single batched
//! authority call. Modules the authority cannot account for keep an empty
//! sum and are dropped later by the descriptor builder.

use crate::authority::ModuleAuthority;
use crate::error::Result;
use crate::index::ModuleIndex;
use crate::warning::{ResolveWarning, Warnings};
use camino::Utf8Path;
use log::debug;

/// Downloads missing checksums and returns how many records were filled.
///
/// No authority call is made when every record already has a sum.
///
/// # Errors
///
/// Propagates process and decode errors from the authority.
pub fn recover_sums<A>(
    authority: &A,
    workspace: &Utf8Path,
    index: &mut ModuleIndex,
    warnings: &mut Warnings,
) -> Result<usize>
where
    A: ModuleAuthority + ?Sized,
{
    let targets = index.missing_sums();
    if targets.is_empty() {
        debug!("all module sums found in ledger");
        return Ok(0);
    }

    let downloaded = authority.download_checksums(workspace, &targets)?;

    let mut recovered = 0;
    for module in downloaded {
        if let Some(message) = module.error.filter(|message| !message.is_empty()) {
            warnings.push(ResolveWarning::DownloadFailed {
                module: format!("{}@{}", module.path, module.version),
                message,
            });
            continue;
        }
        if module.sum.is_empty() {
            continue;
        }
        let Some(record) = index.get_mut(&module.path) else {
            debug!("ignoring download of unindexed module {}", module.path);
            continue;
        };
        if !record.has_sum() {
            recovered += 1;
        }
        record.sum = module.sum;
    }

    debug!("recovered {recovered} of {} missing sums", targets.len());
    Ok(recovered)
}
