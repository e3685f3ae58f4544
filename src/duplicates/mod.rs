//! Duplicate detection pipeline.
//!
//! This module provides:
//! - Size-based grouping ([`group_by_size`])
//! - The two-phase hash engine ([`HashEngine`])
//! - Resolution of full-hash buckets into [`DuplicateSet`]s ([`resolve`])

pub mod engine;
pub mod groups;

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::scanner::{digest_to_hex, Digest, FileEntry};

pub use engine::{default_workers, EngineConfig, EngineStats, HashEngine};
pub use groups::{group_by_size, GroupingStats};

/// Files confirmed byte-identical by a shared full-content digest.
///
/// The first member is the survivor (kept on disk); every other member is
/// redundant and eligible for removal or linking. Member order is the order
/// of discovery within the bucket: deterministic within a run, not stable
/// across runs.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateSet {
    /// Shared BLAKE3 digest of the file content
    #[serde(serialize_with = "hex_digest")]
    pub digest: Digest,
    /// File size in bytes (shared by all members)
    pub size: u64,
    /// All members; `files[0]` is the survivor
    pub files: Vec<FileEntry>,
}

impl DuplicateSet {
    /// Create a new duplicate set.
    #[must_use]
    pub fn new(digest: Digest, size: u64, files: Vec<FileEntry>) -> Self {
        Self {
            digest,
            size,
            files,
        }
    }

    /// The retained member.
    ///
    /// # Panics
    ///
    /// Panics if the set is empty; [`resolve`] only emits sets with 2+
    /// members.
    #[must_use]
    pub fn survivor(&self) -> &FileEntry {
        &self.files[0]
    }

    /// The members eligible for removal or linking.
    #[must_use]
    pub fn redundant(&self) -> &[FileEntry] {
        &self.files[1..]
    }

    /// Number of members in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of redundant members.
    #[must_use]
    pub fn redundant_count(&self) -> u64 {
        self.files.len().saturating_sub(1) as u64
    }

    /// Bytes reclaimed by disposing every redundant member.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * self.redundant_count()
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_to_hex(&self.digest)
    }
}

fn hex_digest<S: Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&digest_to_hex(digest))
}

/// Aggregate counts over the resolved duplicate sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Number of duplicate sets
    pub set_count: u64,
    /// Redundant files across all sets (total members minus one survivor each)
    pub redundant_count: u64,
    /// Bytes reclaimable by disposing every redundant file
    pub reclaimable_bytes: u64,
}

/// Partition full-hash buckets into duplicate sets.
///
/// Buckets with a single member are not duplicates and are discarded. For
/// every other bucket one [`DuplicateSet`] is emitted with all members;
/// `redundant_count` sums `len - 1` per set. Sets are ordered largest file
/// size first for presentation; member order within a set is untouched.
///
/// No error conditions; empty input yields empty output.
#[must_use]
pub fn resolve(buckets: HashMap<Digest, Vec<FileEntry>>) -> (Vec<DuplicateSet>, ResolveStats) {
    let mut sets = Vec::new();
    let mut stats = ResolveStats::default();

    for (digest, files) in buckets {
        if files.len() < 2 {
            continue;
        }
        let size = files[0].size;
        let set = DuplicateSet::new(digest, size, files);
        stats.set_count += 1;
        stats.redundant_count += set.redundant_count();
        stats.reclaimable_bytes += set.reclaimable_bytes();
        log::debug!(
            "Duplicate set {}: {} file(s), {} bytes each",
            set.digest_hex(),
            set.len(),
            size
        );
        sets.push(set);
    }

    sets.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.survivor().path.cmp(&b.survivor().path))
    });

    log::info!(
        "Resolved {} duplicate set(s), {} redundant file(s), {} bytes reclaimable",
        stats.set_count,
        stats.redundant_count,
        stats.reclaimable_bytes
    );

    (sets, stats)
}
