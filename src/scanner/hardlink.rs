//! Hardlink detection for the inventory pass.
//!
//! Multiple directory entries can point at the same inode. Such paths share
//! storage already: reporting them as duplicates would overcount reclaimable
//! bytes, and re-linking them is wasted work. The walker therefore collects
//! only the first path seen for each inode.
//!
//! Detection uses `(device, inode)` pairs on Unix. On other platforms every
//! path is treated as a distinct file; duplicate hashing still gives a
//! correct (if redundant) answer there.

use std::collections::HashSet;
use std::fs::Metadata;

/// Tracks seen inodes so each underlying file is collected once.
///
/// Not thread-safe; the walker owns one tracker per traversal.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    seen: HashSet<InodeKey>,
}

impl HardlinkTracker {
    /// Create a new hardlink tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `metadata` names an inode that was already seen.
    ///
    /// The first occurrence of an inode is recorded and reported as `false`;
    /// every later occurrence returns `true`. On platforms without inode
    /// support this always returns `false`.
    pub fn is_hardlink(&mut self, metadata: &Metadata) -> bool {
        match InodeKey::from_metadata(metadata) {
            Some(key) => !self.seen.insert(key),
            None => false,
        }
    }

    /// Number of unique inodes tracked so far.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InodeKey {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    _unsupported: (),
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn first_occurrence_is_not_a_hardlink() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(&dir, "test.txt", "content");
        let metadata = std::fs::metadata(&path).unwrap();

        let mut tracker = HardlinkTracker::new();
        assert!(!tracker.is_hardlink(&metadata));
    }

    #[test]
    fn distinct_files_are_not_hardlinks() {
        let dir = TempDir::new().unwrap();
        let meta1 = std::fs::metadata(create_test_file(&dir, "a.txt", "one")).unwrap();
        let meta2 = std::fs::metadata(create_test_file(&dir, "b.txt", "two")).unwrap();

        let mut tracker = HardlinkTracker::new();
        assert!(!tracker.is_hardlink(&meta1));
        assert!(!tracker.is_hardlink(&meta2));
    }

    #[test]
    #[cfg(unix)]
    fn hardlinks_share_an_inode() {
        let dir = TempDir::new().unwrap();
        let original = create_test_file(&dir, "original.txt", "content");
        let link1 = dir.path().join("link1.txt");
        let link2 = dir.path().join("link2.txt");
        std::fs::hard_link(&original, &link1).unwrap();
        std::fs::hard_link(&original, &link2).unwrap();

        let mut tracker = HardlinkTracker::new();
        assert!(!tracker.is_hardlink(&std::fs::metadata(&original).unwrap()));
        assert!(tracker.is_hardlink(&std::fs::metadata(&link1).unwrap()));
        assert!(tracker.is_hardlink(&std::fs::metadata(&link2).unwrap()));
        assert_eq!(tracker.seen_count(), 1);
    }
}
