//! Link mode: replace redundant members with hard links to the survivor.

use std::fs;

use crate::duplicates::DuplicateSet;

use super::{ActionError, Disposed, DispositionFailure};

/// Replace every redundant member with a hard link to its set's survivor.
///
/// For each redundant member the existing file is removed, then a hard link
/// to the survivor is created at the same path. The first error in either
/// step stops the run. A failure between the remove and the link leaves the
/// path with neither file nor link; that artifact is named explicitly in the
/// returned error rather than silently ignored.
///
/// # Errors
///
/// Returns [`DispositionFailure`] carrying the files and bytes already
/// reclaimed before the failing path.
pub fn link_duplicates(sets: &[DuplicateSet]) -> Result<Disposed, DispositionFailure> {
    let mut disposed = Disposed::default();

    for set in sets {
        let target = &set.survivor().path;
        for file in set.redundant() {
            if let Err(source) = fs::remove_file(&file.path) {
                return Err(DispositionFailure {
                    partial: disposed,
                    error: ActionError::Remove {
                        path: file.path.clone(),
                        source,
                    },
                });
            }
            if let Err(source) = fs::hard_link(target, &file.path) {
                return Err(DispositionFailure {
                    partial: disposed,
                    error: ActionError::Link {
                        path: file.path.clone(),
                        target: target.clone(),
                        source,
                    },
                });
            }
            disposed.files += 1;
            disposed.bytes += file.size;
            log::debug!("Linked {} -> {}", file.path.display(), target.display());
        }
    }

    log::info!(
        "Converted {} file(s) into hard links, reclaimed {} bytes",
        disposed.files,
        disposed.bytes
    );
    Ok(disposed)
}
