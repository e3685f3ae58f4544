//! Disposition of confirmed duplicate sets.
//!
//! Two mutually exclusive modes operate on resolved [`DuplicateSet`]s:
//!
//! - [`remove_duplicates`]: delete every redundant member, keeping the
//!   survivor.
//! - [`link_duplicates`]: replace every redundant member with a hard link to
//!   the survivor.
//!
//! Both modes are single-threaded over sets (the expensive work already
//! happened in hashing) and stop at the first filesystem error. Disposition
//! is not transactional: files already processed stay processed, and the
//! failure carries the partial totals so the caller can report exactly how
//! far the operation got.
//!
//! [`DuplicateSet`]: crate::duplicates::DuplicateSet

pub mod link;
pub mod remove;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use link::link_duplicates;
pub use remove::remove_duplicates;

/// Totals over redundant files successfully disposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disposed {
    /// Redundant files removed or linked
    pub files: u64,
    /// Bytes reclaimed
    pub bytes: u64,
}

/// Error for an individual disposition step.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Deleting a redundant file failed; the file is untouched.
    #[error("failed to remove {}: {source}", .path.display())]
    Remove {
        /// Path that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Creating the hard link failed *after* the redundant file was removed.
    /// The path now holds neither the old file nor a link; it must be
    /// restored from the surviving copy at `target`.
    #[error(
        "failed to link {} to {}: {source} ({} was removed and not re-linked)",
        .path.display(),
        .target.display(),
        .path.display()
    )]
    Link {
        /// Path that was removed but not re-linked
        path: PathBuf,
        /// The surviving file the link should have pointed at
        target: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// A disposition run that stopped at its first error.
///
/// `partial` reports the files already disposed before the failure; they are
/// not rolled back.
#[derive(Debug, Error)]
#[error("{error}; {} file(s) already disposed ({} bytes reclaimed)", .partial.files, .partial.bytes)]
pub struct DispositionFailure {
    /// Totals accumulated before the failure
    pub partial: Disposed,
    /// The step that failed
    #[source]
    pub error: ActionError,
}
