//! BLAKE3 file hashing with streaming reads.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing BLAKE3 digests of
//! file contents. Two flavors exist:
//!
//! - [`Hasher::quick_hash`]: digest over at most the first
//!   [`QUICK_HASH_SIZE`] bytes. For files shorter than the limit this is
//!   already the full-content digest.
//! - [`Hasher::full_hash`]: digest over the entire byte stream.
//!
//! Both stream through a fixed buffer, so memory use is independent of file
//! size. The file handle is opened and closed within the call.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::HashError;

/// Number of bytes covered by the quick digest.
///
/// Files shorter than this are finalized in a single read: their quick digest
/// equals their full-content digest.
pub const QUICK_HASH_SIZE: u64 = 128 * 1024;

/// Read buffer size for streaming hashes.
const READ_BUF_SIZE: usize = 64 * 1024;

/// A 256-bit BLAKE3 content digest.
pub type Digest = [u8; 32];

/// Streaming BLAKE3 file hasher.
///
/// Stateless; share one instance across workers via `Arc`.
///
/// # Example
///
/// ```no_run
/// use dupescan::scanner::Hasher;
/// use std::path::Path;
///
/// let hasher = Hasher::new();
/// let (digest, bytes_read) = hasher.full_hash(Path::new("/some/file")).unwrap();
/// println!("{} bytes hashed", bytes_read);
/// ```
#[derive(Debug, Default)]
pub struct Hasher;

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Digest over at most the first [`QUICK_HASH_SIZE`] bytes of `path`.
    ///
    /// Returns the digest and the number of bytes actually read, which is
    /// `min(file size, QUICK_HASH_SIZE)`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn quick_hash(&self, path: &Path) -> Result<(Digest, u64), HashError> {
        let file = open(path)?;
        hash_reader(path, file.take(QUICK_HASH_SIZE))
    }

    /// Digest over the entire content of `path`.
    ///
    /// Returns the digest and the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<(Digest, u64), HashError> {
        let file = open(path)?;
        hash_reader(path, file)
    }
}

fn open(path: &Path) -> Result<File, HashError> {
    File::open(path).map_err(|source| HashError::from_io(path, source))
}

fn hash_reader(path: &Path, mut reader: impl Read) -> Result<(Digest, u64), HashError> {
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|source| HashError::from_io(path, source))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    Ok((*hasher.finalize().as_bytes(), total))
}

/// Format a digest as a lowercase hexadecimal string.
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
