//! Remove mode: delete every redundant member of each duplicate set.

use std::fs;

use crate::duplicates::DuplicateSet;

use super::{ActionError, Disposed, DispositionFailure};

/// Delete every redundant member of every set, keeping each survivor.
///
/// Sets are processed in order; within a set the survivor (`files[0]`) is
/// untouched and every other member is deleted. The first deletion error
/// stops the run.
///
/// # Errors
///
/// Returns [`DispositionFailure`] carrying the files and bytes already
/// reclaimed before the failing path. Earlier deletions are not rolled back.
pub fn remove_duplicates(sets: &[DuplicateSet]) -> Result<Disposed, DispositionFailure> {
    let mut disposed = Disposed::default();

    for set in sets {
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
            disposed.files += 1;
            disposed.bytes += file.size;
            log::debug!("Removed {}", file.path.display());
        }
    }

    log::info!(
        "Removed {} file(s), reclaimed {} bytes",
        disposed.files,
        disposed.bytes
    );
    Ok(disposed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileEntry;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    fn set_of(paths: &[&PathBuf], size: u64) -> DuplicateSet {
        DuplicateSet::new(
            [0u8; 32],
            size,
            paths
                .iter()
                .map(|p| FileEntry::new((*p).clone(), size))
                .collect(),
        )
    }

    #[test]
    fn keeps_survivor_and_deletes_the_rest() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "a.txt", b"same bytes");
        let b = write_file(dir.path(), "b.txt", b"same bytes");
        let c = write_file(dir.path(), "c.txt", b"same bytes");

        let disposed = remove_duplicates(&[set_of(&[&a, &b, &c], 10)]).unwrap();

        assert_eq!(disposed.files, 2);
        assert_eq!(disposed.bytes, 20);
        assert!(a.exists());
        assert!(!b.exists());
        assert!(!c.exists());
        assert_eq!(fs::read(&a).unwrap(), b"same bytes");
    }

    #[test]
    fn empty_sets_dispose_nothing() {
        let disposed = remove_duplicates(&[]).unwrap();
        assert_eq!(disposed, Disposed::default());
    }

    #[test]
    fn stops_at_first_error_with_partial_totals() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "a.txt", b"0123456789");
        let b = write_file(dir.path(), "b.txt", b"0123456789");
        let missing = dir.path().join("missing.txt");
        let c = write_file(dir.path(), "c.txt", b"0123456789");

        // b disposes fine, `missing` fails, c is never reached.
        let sets = [set_of(&[&a, &b, &missing, &c], 10)];
        let failure = remove_duplicates(&sets).unwrap_err();

        assert_eq!(failure.partial.files, 1);
        assert_eq!(failure.partial.bytes, 10);
        assert!(matches!(failure.error, ActionError::Remove { .. }));
        assert!(!b.exists());
        assert!(c.exists());
    }
}
