//! Size-based file grouping, the first stage of duplicate detection.
//!
//! # Overview
//!
//! Files with different sizes cannot be byte-identical, so grouping by exact
//! size eliminates most of a typical tree before any content is read. Groups
//! with a single member are pruned immediately; a file with a unique size is
//! never hashed.
//!
//! # Example
//!
//! ```
//! use dupescan::scanner::FileEntry;
//! use dupescan::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.files_in_groups, 2); // the two 1024-byte files
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::HashMap;

use crate::scanner::FileEntry;

/// Statistics from the size-grouping stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes seen
    pub unique_sizes: usize,
    /// Number of files in retained groups (could still be duplicates)
    pub files_in_groups: u64,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of retained groups (2+ files each)
    pub group_count: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by exact size, pruning singleton groups.
///
/// Pure function over its input: no I/O, no error conditions, empty input
/// yields empty output.
///
/// # Returns
///
/// A tuple of:
/// - `HashMap<u64, Vec<FileEntry>>` - retained groups (2+ files each)
/// - [`GroupingStats`] - counts describing the grouping
///
/// # Example
///
/// ```
/// use dupescan::scanner::FileEntry;
/// use dupescan::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (groups, stats) = group_by_size(files);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1); // the 200-byte file
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
) -> (HashMap<u64, Vec<FileEntry>>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let retained: HashMap<u64, Vec<FileEntry>> = all_groups
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!("Unique size {size}: {}", files[0].path.display());
                false
            } else {
                stats.files_in_groups += files.len() as u64;
                stats.group_count += 1;
                log::debug!("Size group {size} bytes: {} candidate(s)", files.len());
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping: {} file(s) -> {} candidate(s) ({:.1}% eliminated)",
        stats.total_files,
        stats.files_in_groups,
        stats.elimination_rate()
    );

    (retained, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_file(path: &str, size: u64) -> FileEntry {
        FileEntry::new(PathBuf::from(path), size)
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let (groups, stats) = group_by_size(Vec::new());

        assert!(groups.is_empty());
        assert_eq!(stats, GroupingStats::default());
    }

    #[test]
    fn all_unique_sizes_eliminated() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 200),
            make_file("/c.txt", 300),
        ];
        let (groups, stats) = group_by_size(files);

        assert!(groups.is_empty());
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.unique_sizes, 3);
        assert_eq!(stats.eliminated_unique, 3);
        assert_eq!(stats.files_in_groups, 0);
    }

    #[test]
    fn same_size_files_grouped() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 100),
            make_file("/c.txt", 200),
        ];
        let (groups, stats) = group_by_size(files);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&100].len(), 2);
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.unique_sizes, 2);
        assert_eq!(stats.eliminated_unique, 1);
        assert_eq!(stats.files_in_groups, 2);
        assert_eq!(stats.group_count, 1);
    }

    #[test]
    fn multiple_groups_counted() {
        let files = vec![
            make_file("/a1.txt", 100),
            make_file("/a2.txt", 100),
            make_file("/b1.txt", 200),
            make_file("/b2.txt", 200),
            make_file("/b3.txt", 200),
            make_file("/c.txt", 300),
        ];
        let (groups, stats) = group_by_size(files);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&100].len(), 2);
        assert_eq!(groups[&200].len(), 3);
        assert_eq!(stats.files_in_groups, 5);
        assert_eq!(stats.group_count, 2);
        assert_eq!(stats.eliminated_unique, 1);
    }

    #[test]
    fn empty_files_group_together() {
        // Size-0 files are ordinary candidates: they all share one digest
        // and resolve into a single duplicate set downstream.
        let files = vec![
            make_file("/empty1", 0),
            make_file("/empty2", 0),
            make_file("/normal.txt", 100),
        ];
        let (groups, stats) = group_by_size(files);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&0].len(), 2);
        assert_eq!(stats.eliminated_unique, 1);
    }

    #[test]
    fn group_members_keep_input_order() {
        let files = vec![
            make_file("/first.txt", 64),
            make_file("/second.txt", 64),
            make_file("/third.txt", 64),
        ];
        let (groups, _) = group_by_size(files);

        let members: Vec<_> = groups[&64]
            .iter()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(members, vec!["/first.txt", "/second.txt", "/third.txt"]);
    }

    #[test]
    fn elimination_rate_half() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 100),
            make_file("/c.txt", 200),
            make_file("/d.txt", 300),
        ];
        let (_, stats) = group_by_size(files);

        assert!((stats.elimination_rate() - 50.0).abs() < 0.1);
    }

    #[test]
    fn total_size_accumulates() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 200),
            make_file("/c.txt", 300),
        ];
        let (_, stats) = group_by_size(files);

        assert_eq!(stats.total_size, 600);
    }
}
