//! Persistent Sorted Array (PSA) Module
//!
//! This module implements a **file-backed**, **random-access**, and **mutable**
//! array of fixed-width `u64` records with a durable length prefix. One PSA
//! backs each on-disk level of the engine.
//!
//! ## Design Overview
//!
//! A PSA behaves like a `Vec<u64>` whose storage is a file. The first eight
//! bytes hold the element count; the records follow back to back. The count
//! is the single source of truth for how much of the file is live: bytes past
//! `HEADER_SIZE + len * RECORD_SIZE` may exist (left behind by a shrinking
//! [`PersistentSortedArray::resize`]) and are never read.
//!
//! # On-disk layout
//!
//! ```text
//! [LEN_U64_LE][REC_U64_LE][REC_U64_LE]...
//! ```
//!
//! All integers are little-endian regardless of host byte order.
//!
//! # Write ordering
//!
//! - [`PersistentSortedArray::push`] writes the record *before* updating the
//!   header, so an interrupted append can at worst leave a trailing record
//!   the header does not claim.
//! - [`PersistentSortedArray::resize`] touches only the header; a shrink
//!   abandons the tail bytes in place.
//!
//! # Concurrency model
//!
//! A PSA owns its file handle exclusively and is **not** safe for concurrent
//! mutation through multiple handles on the same path. The engine opens at
//! most one writable PSA per level at a time and drops it when the operation
//! completes.
//!
//! # Guarantees
//!
//! - **Durable length:** the element count is persisted in the file itself.
//! - **Honest header:** after any completed operation the header equals the
//!   number of valid records that follow it.
//! - **Bounded torn writes:** an interrupted operation leaves either a
//!   trailing unreferenced record or a stale-but-parseable header, never a
//!   header claiming records that were not written.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, trace};

use crate::Key;

// ------------------------------------------------------------------------------------------------
// Constants
// ------------------------------------------------------------------------------------------------

/// Size of one stored record in bytes (a single little-endian `u64` key).
pub const RECORD_SIZE: u64 = 8;

/// Size of the length prefix in bytes (a single little-endian `u64` count).
pub const HEADER_SIZE: u64 = 8;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by [`PersistentSortedArray`] operations.
///
/// Every operation touches the filesystem, so every operation can fail this
/// way. Failures are fatal to the caller; there are no retries.
#[derive(Debug, Error)]
pub enum PsaError {
    /// Underlying I/O error (open/create/seek/read/write/sync).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ------------------------------------------------------------------------------------------------
// PSA Core
// ------------------------------------------------------------------------------------------------

/// A file-backed, length-prefixed, random-access array of `u64` records.
///
/// See the [module-level documentation](self) for format, write ordering,
/// and guarantees.
///
/// The engine keeps every PSA strictly sorted ascending between operations;
/// the PSA itself does not enforce ordering. During an in-place merge the
/// file is transiently unsorted, and only the merging engine observes it.
#[derive(Debug)]
pub struct PersistentSortedArray {
    /// Exclusively owned read/write handle.
    file: File,

    /// Path of the backing file, kept for diagnostics.
    path: PathBuf,
}

impl PersistentSortedArray {
    /// Opens the array at `path`, creating an empty one if the file does
    /// not exist.
    ///
    /// A freshly created file receives a zero length prefix before the
    /// handle is returned, so every open PSA has a valid header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PsaError> {
        let path_ref = path.as_ref();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path_ref)?;

        if file.metadata()?.len() == 0 {
            file.write_all(&0u64.to_le_bytes())?;
            debug!(path = %path_ref.display(), "PSA created with empty header");
        }

        trace!(path = %path_ref.display(), "PSA opened");

        Ok(Self {
            file,
            path: path_ref.to_path_buf(),
        })
    }

    /// Returns the number of live records, read from the length prefix.
    ///
    /// Reads go through `&File`, so shared views can interrogate the array;
    /// only mutation requires exclusive access.
    pub fn len(&self) -> Result<u64, PsaError> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Returns `true` when the array holds no live records.
    pub fn is_empty(&self) -> Result<bool, PsaError> {
        Ok(self.len()? == 0)
    }

    /// Reads the record at `index`.
    ///
    /// The index must be below [`PersistentSortedArray::len`]; reading past
    /// the live region is a caller bug. An index beyond the physical file
    /// fails with an I/O error, one inside an abandoned tail yields stale
    /// bytes.
    pub fn get(&self, index: u64) -> Result<Key, PsaError> {
        let mut buf = [0u8; RECORD_SIZE as usize];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(HEADER_SIZE + index * RECORD_SIZE))?;
        file.read_exact(&mut buf)?;
        Ok(Key::from_le_bytes(buf))
    }

    /// Overwrites the record at `index` in place. The length prefix is not
    /// touched.
    pub fn set(&mut self, index: u64, key: Key) -> Result<(), PsaError> {
        self.file
            .seek(SeekFrom::Start(HEADER_SIZE + index * RECORD_SIZE))?;
        self.file.write_all(&key.to_le_bytes())?;
        Ok(())
    }

    /// Appends `key` after the last live record, then bumps the length
    /// prefix.
    ///
    /// The record write precedes the header update; see the module docs for
    /// the torn-write bound this ordering buys.
    pub fn push(&mut self, key: Key) -> Result<(), PsaError> {
        let len = self.len()?;
        self.set(len, key)?;
        self.resize(len + 1)?;
        trace!(path = %self.path.display(), len = len + 1, "PSA record appended");
        Ok(())
    }

    /// Rewrites the length prefix to `len`.
    ///
    /// Growing exposes whatever bytes already sit past the old end (the
    /// caller overwrites them before anyone reads); shrinking abandons the
    /// tail without zeroing or truncating it.
    pub fn resize(&mut self, len: u64) -> Result<(), PsaError> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&len.to_le_bytes())?;
        Ok(())
    }

    /// Removes the record at `index`, shifting every later record down one
    /// position and shrinking the length by one.
    ///
    /// O(len) pairwise copies. Acceptable: the engine only erases on
    /// `remove`, which is not a hot path.
    pub fn erase(&mut self, index: u64) -> Result<(), PsaError> {
        let len = self.len()?;
        debug_assert!(index < len, "erase index out of range");

        for i in index..len - 1 {
            let next = self.get(i + 1)?;
            self.set(i, next)?;
        }
        self.resize(len - 1)?;

        trace!(path = %self.path.display(), index, len = len - 1, "PSA record erased");
        Ok(())
    }

    /// Drops all records by zeroing the length prefix. The record bytes stay
    /// behind as an abandoned tail.
    pub fn clear(&mut self) -> Result<(), PsaError> {
        self.resize(0)
    }

    /// Flushes the file to stable storage via `fsync`.
    pub fn sync(&mut self) -> Result<(), PsaError> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
