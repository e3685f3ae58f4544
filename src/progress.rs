//! Progress reporting for the hashing phases.
//!
//! The engine reports bytes processed through the [`ProgressSink`] trait; the
//! sink's lifecycle is owned by the caller, never by the engine. [`Progress`]
//! is the terminal implementation, drawing one byte-denominated indicatif bar
//! per phase. Reporting is a side channel: it must never affect correctness
//! or ordering, and a sink must tolerate concurrent increments from all
//! workers.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// The two hashing phases, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashPhase {
    /// Prefix digests over at most the first 128 KiB of each candidate.
    Quick,
    /// Full-content digests over promoted files.
    Full,
}

impl HashPhase {
    /// Human-readable label shown next to the phase's bar.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Quick => "Initial pass",
            Self::Full => "Verification",
        }
    }
}

/// Byte-count sink for hashing progress.
///
/// `phase_started` announces the phase's byte budget up front; workers then
/// call `bytes_processed` after each unit of work. Increments are
/// monotonically accumulating within a phase.
pub trait ProgressSink: Send + Sync {
    /// Called when a phase begins, with the total byte budget for the phase.
    fn phase_started(&self, phase: HashPhase, total_bytes: u64);

    /// Called by workers after each unit of work with the bytes just hashed.
    fn bytes_processed(&self, bytes: u64);

    /// Called when a phase completes.
    fn phase_finished(&self, phase: HashPhase);
}

/// Terminal progress reporter over indicatif.
///
/// Phases run strictly one after another, so a single active bar suffices;
/// starting a new phase replaces the previous bar.
pub struct Progress {
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars are displayed.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            active: Mutex::new(None),
            quiet,
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix:>12.blue} [{bar:40}] {bytes}/{total_bytes} {bytes_per_sec} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
    }
}

impl ProgressSink for Progress {
    fn phase_started(&self, phase: HashPhase, total_bytes: u64) {
        if self.quiet {
            return;
        }

        let bar = ProgressBar::new(total_bytes);
        bar.set_style(Self::bar_style());
        bar.set_prefix(phase.label());

        let mut active = self.active.lock().unwrap();
        if let Some(old) = active.take() {
            old.finish_and_clear();
        }
        *active = Some(bar);
    }

    fn bytes_processed(&self, bytes: u64) {
        if let Some(ref bar) = *self.active.lock().unwrap() {
            bar.inc(bytes);
        }
    }

    fn phase_finished(&self, _phase: HashPhase) {
        if let Some(bar) = self.active.lock().unwrap().take() {
            bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_labels() {
        assert_eq!(HashPhase::Quick.label(), "Initial pass");
        assert_eq!(HashPhase::Full.label(), "Verification");
    }

    #[test]
    fn quiet_progress_ignores_updates() {
        let progress = Progress::new(true);
        progress.phase_started(HashPhase::Quick, 1024);
        progress.bytes_processed(512);
        progress.phase_finished(HashPhase::Quick);
        assert!(progress.active.lock().unwrap().is_none());
    }

    #[test]
    fn phases_replace_the_active_bar() {
        let progress = Progress::new(false);
        progress.phase_started(HashPhase::Quick, 1024);
        assert!(progress.active.lock().unwrap().is_some());

        progress.phase_started(HashPhase::Full, 2048);
        assert!(progress.active.lock().unwrap().is_some());

        progress.phase_finished(HashPhase::Full);
        assert!(progress.active.lock().unwrap().is_none());
    }
}
