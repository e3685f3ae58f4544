//! Directory walker for inventory collection.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, which turns a directory tree
//! into the ordered list of [`FileEntry`] descriptors the detection pipeline
//! consumes. Traversal is single-threaded and sorted, so the sequence is
//! deterministic for a given tree; the expensive work in a run is hashing,
//! not walking.
//!
//! # Features
//!
//! - Minimum-size filtering
//! - Gitignore-style exclusion patterns via the `ignore` crate
//! - Hidden file filtering
//! - Hardlink awareness via [`HardlinkTracker`]: each inode is collected once
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: 1024,
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), config);
//! let files = walker.collect().unwrap();
//! println!("{} candidate files", files.len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

use super::hardlink::HardlinkTracker;
use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker producing the pipeline's file inventory.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Walk the tree and return every regular file passing the filters.
    ///
    /// The root is validated up front; a missing or non-directory root is a
    /// fatal error. Entries *below* the root that cannot be read are logged
    /// and skipped, so one unreadable subdirectory never aborts the scan.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root does not exist, is not a directory,
    /// or cannot be accessed.
    pub fn collect(&self) -> Result<Vec<FileEntry>, ScanError> {
        let root_meta =
            fs::metadata(&self.root).map_err(|source| ScanError::from_io(&self.root, source))?;
        if !root_meta.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let gitignore = self.build_gitignore();
        let mut tracker = HardlinkTracker::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.keep_entry(entry, &gitignore));

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    log::warn!("Skipping {}: {err}", entry.path().display());
                    continue;
                }
            };

            let size = metadata.len();
            if size < self.config.min_size {
                log::trace!(
                    "Below minimum size ({} < {}): {}",
                    size,
                    self.config.min_size,
                    entry.path().display()
                );
                continue;
            }

            if tracker.is_hardlink(&metadata) {
                log::debug!("Already linked, collecting once: {}", entry.path().display());
                continue;
            }

            files.push(FileEntry::new(entry.into_path(), size));
        }

        log::debug!(
            "Collected {} file(s) under {}",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }

    /// Decide whether traversal descends into / yields an entry.
    ///
    /// The root itself (depth 0) is always kept so filtering can never prune
    /// the whole walk.
    fn keep_entry(&self, entry: &walkdir::DirEntry, gitignore: &Option<Gitignore>) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        if self.config.skip_hidden
            && entry
                .file_name()
                .to_string_lossy()
                .starts_with('.')
        {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return false;
        }

        !self.should_ignore(entry.path(), entry.file_type().is_dir(), gitignore)
    }

    /// Build gitignore matcher from config patterns and the root `.gitignore`.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {e}",
                    gitignore_path.display()
                );
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{pattern}': {e}");
            }
        }

        match builder.build() {
            Ok(gitignore) => {
                if gitignore.is_empty() {
                    None
                } else {
                    Some(gitignore)
                }
            }
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {e}");
                None
            }
        }
    }

    /// Check if a path matches the configured exclusion patterns.
    fn should_ignore(&self, path: &Path, is_dir: bool, gitignore: &Option<Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };

        // Gitignore matching expects paths relative to the root, with
        // forward slashes even on Windows.
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative.to_string_lossy();
        let normalized = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };

        gi.matched(normalized, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let walker = Walker::new(&dir.path().join("nope"), WalkerConfig::default());
        assert!(matches!(walker.collect(), Err(ScanError::NotFound(_))));
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "file.txt", b"data");
        let walker = Walker::new(&path, WalkerConfig::default());
        assert!(matches!(walker.collect(), Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn collects_regular_files_recursively() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", b"aaaa");
        write_file(dir.path(), "sub/b.txt", b"bbbb");

        let walker = Walker::new(dir.path(), WalkerConfig::default());
        let files = walker.collect().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.size == 4));
    }

    #[test]
    fn min_size_filters_small_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "small.txt", b"ab");
        write_file(dir.path(), "large.txt", b"abcdefgh");

        let config = WalkerConfig {
            min_size: 5,
            ..Default::default()
        };
        let files = Walker::new(dir.path(), config).collect().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("large.txt"));
    }

    #[test]
    fn hidden_entries_skipped_when_configured() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), ".hidden.txt", b"data");
        write_file(dir.path(), ".hiddendir/inner.txt", b"data");
        write_file(dir.path(), "visible.txt", b"data");

        let config = WalkerConfig {
            skip_hidden: true,
            ..Default::default()
        };
        let files = Walker::new(dir.path(), config).collect().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("visible.txt"));
    }

    #[test]
    fn ignore_patterns_exclude_matches() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "keep.txt", b"data");
        write_file(dir.path(), "drop.tmp", b"data");

        let config = WalkerConfig {
            ignore_patterns: vec!["*.tmp".to_string()],
            ..Default::default()
        };
        let files = Walker::new(dir.path(), config).collect().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("keep.txt"));
    }

    #[test]
    fn traversal_order_is_deterministic() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "c.txt", b"data");
        write_file(dir.path(), "a.txt", b"data");
        write_file(dir.path(), "b.txt", b"data");

        let first = Walker::new(dir.path(), WalkerConfig::default())
            .collect()
            .unwrap();
        let second = Walker::new(dir.path(), WalkerConfig::default())
            .collect()
            .unwrap();
        assert_eq!(first, second);
        assert!(first[0].path.ends_with("a.txt"));
        assert!(first[2].path.ends_with("c.txt"));
    }

    #[test]
    #[cfg(unix)]
    fn hardlinked_paths_collected_once() {
        let dir = TempDir::new().unwrap();
        let original = write_file(dir.path(), "original.txt", b"shared bytes");
        fs::hard_link(&original, dir.path().join("alias.txt")).unwrap();

        let files = Walker::new(dir.path(), WalkerConfig::default())
            .collect()
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn symlinks_not_followed_by_default() {
        let dir = TempDir::new().unwrap();
        let target = write_file(dir.path(), "target.txt", b"data");
        std::os::unix::fs::symlink(&target, dir.path().join("alias.txt")).unwrap();

        let files = Walker::new(dir.path(), WalkerConfig::default())
            .collect()
            .unwrap();
        assert_eq!(files.len(), 1);
    }
}
