//! Two-phase concurrent hash engine, the core of duplicate detection.
//!
//! # Overview
//!
//! The engine never declares two files identical from a prefix digest alone,
//! and never reads a file in full unless it has to:
//!
//! 1. **Quick pass.** Every candidate gets a digest over at most the first
//!    [`QUICK_HASH_SIZE`] bytes. Files shorter than the limit are finalized
//!    immediately (their quick digest *is* the full digest) and skip the
//!    second read entirely.
//! 2. **Promotion.** When two files collide on a quick digest, both are
//!    queued for full hashing; each later collider queues only itself. A file
//!    with a unique quick digest is never read again — the dominant case for
//!    large trees with few duplicates.
//! 3. **Verification pass.** Promoted files are hashed over their entire
//!    content and merged with the small-file results.
//!
//! Both passes run on a fixed pool of worker threads fed by a bounded
//! channel. A worker count of 1 is the sequential mode; there is no separate
//! sequential implementation. The verification pass starts only after the
//! quick pass has fully drained, so its work list is derived from complete
//! phase-1 state.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{group_by_size, EngineConfig, HashEngine};
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let files = Walker::new(Path::new("."), WalkerConfig::default())
//!     .collect()
//!     .unwrap();
//! let (groups, _) = group_by_size(files);
//!
//! let engine = HashEngine::new(EngineConfig::default().with_workers(4));
//! let (buckets, stats) = engine.run(groups);
//! println!("{} file(s) promoted to full hashing", stats.promoted);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::bounded;

use crate::progress::{HashPhase, ProgressSink};
use crate::scanner::{Digest, FileEntry, Hasher, QUICK_HASH_SIZE};

/// Number of workers matching the machine's available parallelism.
#[must_use]
pub fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// Configuration for the hash engine.
#[derive(Clone)]
pub struct EngineConfig {
    /// Worker threads per hashing phase. 1 runs the passes sequentially.
    pub workers: usize,
    /// Optional sink receiving byte-level progress from the workers.
    pub progress: Option<Arc<dyn ProgressSink>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            progress: None,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("workers", &self.workers)
            .field("progress", &self.progress.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

impl EngineConfig {
    /// Set the worker count (clamped to at least 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the progress sink.
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }
}

/// Statistics from an engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Files entering the quick pass
    pub candidate_files: usize,
    /// Files successfully hashed in the quick pass
    pub quick_hashed: usize,
    /// Files finalized by the quick pass alone (smaller than the quick limit)
    pub finalized_small: usize,
    /// Files queued for the verification pass
    pub promoted: usize,
    /// Files successfully hashed in the verification pass
    pub full_hashed: usize,
    /// Files dropped after a read or hash failure in either pass
    pub failed_files: usize,
    /// Bytes read during the quick pass
    pub quick_bytes: u64,
    /// Bytes read during the verification pass
    pub full_bytes: u64,
}

/// Quick-pass accumulation state.
///
/// One mutex guards the whole struct; the per-file critical section is the
/// O(1) bucket insert plus the promotion transition. Reads and digest
/// computation happen outside the lock.
#[derive(Debug, Default)]
struct QuickState {
    /// Quick-digest buckets. Only files of at least [`QUICK_HASH_SIZE`]
    /// bytes appear here; shorter files go straight to `finalized`.
    partial: HashMap<Digest, Vec<FileEntry>>,
    /// Authoritative full-content buckets, seeded by small files.
    finalized: HashMap<Digest, Vec<FileEntry>>,
    /// Files queued for the verification pass, in promotion order.
    promoted: Vec<FileEntry>,
    quick_hashed: usize,
    finalized_small: usize,
    failed: usize,
    bytes: u64,
}

impl QuickState {
    fn record(&mut self, file: FileEntry, digest: Digest, bytes: u64) {
        self.quick_hashed += 1;
        self.bytes += bytes;
        if file.size < QUICK_HASH_SIZE {
            // Small-file optimization: the digest already covers the whole
            // file, so a second read would recompute the same value.
            self.finalized_small += 1;
            self.finalized.entry(digest).or_default().push(file);
        } else {
            self.promote(digest, file);
        }
    }

    /// Bucket membership transition 0 -> 1 -> 2 -> N.
    ///
    /// The 1 -> 2 transition queues both members for full hashing; every
    /// later insert queues only the newcomer. Each file sharing a quick
    /// digest with at least one other file is queued exactly once.
    fn promote(&mut self, digest: Digest, file: FileEntry) {
        let bucket = self.partial.entry(digest).or_default();
        bucket.push(file);
        match bucket.len() {
            2 => self.promoted.extend(bucket.iter().cloned()),
            n if n > 2 => {
                if let Some(newcomer) = bucket.last() {
                    self.promoted.push(newcomer.clone());
                }
            }
            _ => {}
        }
    }

    fn record_failure(&mut self) {
        self.failed += 1;
    }
}

/// Verification-pass accumulation state, seeded with the quick pass's
/// finalized buckets so both phases merge into one map.
#[derive(Debug, Default)]
struct FullState {
    buckets: HashMap<Digest, Vec<FileEntry>>,
    full_hashed: usize,
    failed: usize,
    bytes: u64,
}

impl FullState {
    fn record(&mut self, file: FileEntry, digest: Digest, bytes: u64) {
        self.full_hashed += 1;
        self.bytes += bytes;
        self.buckets.entry(digest).or_default().push(file);
    }

    fn record_failure(&mut self) {
        self.failed += 1;
    }
}

/// The two-phase hash engine.
///
/// Consumes size groups and produces full-content digest buckets: any two
/// files in the same bucket are byte-identical (256-bit BLAKE3).
pub struct HashEngine {
    config: EngineConfig,
    hasher: Arc<Hasher>,
}

impl HashEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            hasher: Arc::new(Hasher::new()),
        }
    }

    /// Run both hashing phases over the surviving size groups.
    ///
    /// Returns the full-content buckets and run statistics. Individual files
    /// that fail to read are logged, counted in
    /// [`EngineStats::failed_files`], and excluded from every bucket; they
    /// never abort the run.
    #[must_use]
    pub fn run(
        &self,
        size_groups: HashMap<u64, Vec<FileEntry>>,
    ) -> (HashMap<Digest, Vec<FileEntry>>, EngineStats) {
        let candidates: Vec<FileEntry> = size_groups.into_values().flatten().collect();
        let mut stats = EngineStats {
            candidate_files: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            log::debug!("Hash engine: no candidates");
            return (HashMap::new(), stats);
        }

        let workers = self.config.workers.max(1);

        // ---- Quick pass ----
        log::info!(
            "Quick pass: hashing up to {} KiB of {} file(s) on {} worker(s)",
            QUICK_HASH_SIZE / 1024,
            candidates.len(),
            workers
        );
        self.phase_started(HashPhase::Quick, QUICK_HASH_SIZE * candidates.len() as u64);

        let quick = Mutex::new(QuickState::default());
        run_pool(workers, candidates, |file| {
            match self.hasher.quick_hash(&file.path) {
                Ok((digest, bytes)) => {
                    self.report_bytes(bytes);
                    quick.lock().unwrap().record(file, digest, bytes);
                }
                Err(err) => {
                    log::warn!("Failed to hash {}: {err}", file.path.display());
                    quick.lock().unwrap().record_failure();
                }
            }
        });

        self.phase_finished(HashPhase::Quick);
        let QuickState {
            partial,
            finalized,
            promoted,
            quick_hashed,
            finalized_small,
            failed: quick_failed,
            bytes: quick_bytes,
        } = quick.into_inner().unwrap();

        stats.quick_hashed = quick_hashed;
        stats.finalized_small = finalized_small;
        stats.promoted = promoted.len();
        stats.quick_bytes = quick_bytes;

        let unique_quick = partial.values().filter(|b| b.len() == 1).count();
        log::info!(
            "Quick pass complete: {} finalized small, {} promoted, {} unique (never read again)",
            finalized_small,
            promoted.len(),
            unique_quick
        );
        drop(partial);

        // ---- Verification pass ----
        let mut full_state = FullState {
            buckets: finalized,
            ..Default::default()
        };

        if promoted.is_empty() {
            log::info!("No quick-digest collisions; verification pass skipped");
        } else {
            let full_budget: u64 = promoted.iter().map(|f| f.size).sum();
            log::info!(
                "Verification pass: fully hashing {} file(s) ({} bytes)",
                promoted.len(),
                full_budget
            );
            self.phase_started(HashPhase::Full, full_budget);

            let full = Mutex::new(full_state);
            run_pool(workers, promoted, |file| {
                match self.hasher.full_hash(&file.path) {
                    Ok((digest, bytes)) => {
                        self.report_bytes(bytes);
                        full.lock().unwrap().record(file, digest, bytes);
                    }
                    Err(err) => {
                        log::warn!("Failed to hash {}: {err}", file.path.display());
                        full.lock().unwrap().record_failure();
                    }
                }
            });

            self.phase_finished(HashPhase::Full);
            full_state = full.into_inner().unwrap();
        }

        stats.full_hashed = full_state.full_hashed;
        stats.full_bytes = full_state.bytes;
        stats.failed_files = quick_failed + full_state.failed;

        log::info!(
            "Hash engine complete: {} fully hashed, {} failed",
            stats.full_hashed,
            stats.failed_files
        );

        (full_state.buckets, stats)
    }

    fn phase_started(&self, phase: HashPhase, total_bytes: u64) {
        if let Some(ref sink) = self.config.progress {
            sink.phase_started(phase, total_bytes);
        }
    }

    fn report_bytes(&self, bytes: u64) {
        if let Some(ref sink) = self.config.progress {
            sink.bytes_processed(bytes);
        }
    }

    fn phase_finished(&self, phase: HashPhase) {
        if let Some(ref sink) = self.config.progress {
            sink.phase_finished(phase);
        }
    }
}

/// Run `job` over `items` on a fixed pool of `workers` threads.
///
/// Items are pushed through a bounded channel; dropping the sender closes the
/// queue, and leaving the scope joins every worker, so the caller observes
/// fully merged state when this returns. One worker degenerates to sequential
/// execution over the same code path.
fn run_pool<F>(workers: usize, items: Vec<FileEntry>, job: F)
where
    F: Fn(FileEntry) + Send + Sync,
{
    let (tx, rx) = bounded::<FileEntry>(workers);

    thread::scope(|scope| {
        for _ in 0..workers {
            let rx = rx.clone();
            let job = &job;
            scope.spawn(move || {
                for file in rx {
                    job(file);
                }
            });
        }
        drop(rx);

        for item in items {
            if tx.send(item).is_err() {
                break;
            }
        }
        drop(tx);
    });
}
