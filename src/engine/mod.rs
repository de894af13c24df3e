//! # Tiered LSM Engine
//!
//! This module implements a **synchronous**, single-threaded LSM index over
//! 64-bit keys, with a bounded in-memory buffer and size-tiered on-disk
//! levels.
//!
//! ## Design Overview
//!
//! The engine organises keys across two kinds of layer, queried in order:
//!
//! 1. **Memtable** — a sorted in-memory buffer of pending inserts.
//! 2. **Levels** — on-disk sorted runs `level0`, `level1`, …, each a
//!    [`PersistentSortedArray`]. Levels form a contiguous prefix: `level_i`
//!    existing implies every `level_j` with `j < i` exists too.
//!
//! Inserts land in the memtable. When it reaches capacity the next insert
//! triggers [`Engine::flush`]: the buffer merges into `level0`, and any
//! level whose size then exceeds its threshold merges into its successor.
//! Thresholds grow linearly with depth
//! (`level_growth × capacity × (level + 1)`), yielding a slowly widening
//! tier structure.
//!
//! Level files are discovered lazily by existence on disk; no metadata is
//! cached between operations. PSA handles are opened per operation and
//! dropped when it completes.
//!
//! ## Concurrency Model
//!
//! None. Every operation runs to completion on the caller's thread, and the
//! directory is owned by exactly one engine instance. Pointing two instances
//! at the same directory is undefined.
//!
//! ## Guarantees
//!
//! - **Membership:** [`Engine::contains`] is true iff the key is present in
//!   the memtable or on any level.
//! - **Deletion:** [`Engine::remove`] physically erases every occurrence of
//!   the key from every layer. The same key may legitimately sit on several
//!   levels, since cascades deduplicate only pairwise.
//! - **Bounded levels:** between operations no level exceeds its threshold.
//! - **Flush on drop:** dropping the engine drains the memtable, so orderly
//!   shutdown preserves every acknowledged insert.

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

pub(crate) mod merge;

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, trace};

use crate::Key;
use crate::memtable::Memtable;
use crate::psa::{PersistentSortedArray, PsaError, RECORD_SIZE};

/// Filename prefix of level files inside the engine directory.
pub const LEVEL_FILE_PREFIX: &str = "level";

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Error originating from a level's backing array.
    #[error("Level array error: {0}")]
    Psa(#[from] PsaError),

    /// Underlying filesystem I/O error (directory creation and the like).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

/// Configuration for an [`Engine`] instance.
///
/// The defaults reproduce the standard policy (2 MiB buffer, ×10 level
/// growth); tests shrink `write_buffer_size` to force flushes and cascades
/// with little data.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Max memtable size in bytes before a flush is triggered. Capacity in
    /// keys is this divided by the 8-byte record size.
    pub write_buffer_size: usize,

    /// Per-level size thresholds are
    /// `level_growth * capacity * (level + 1)` keys; a level strictly above
    /// its threshold cascades into the next one.
    pub level_growth: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            write_buffer_size: 2 * 1024 * 1024,
            level_growth: 10,
        }
    }
}

/// Snapshot of engine occupancy returned by [`Engine::stats`].
#[derive(Debug)]
pub struct EngineStats {
    /// Keys currently buffered in the memtable.
    pub memtable_keys: usize,

    /// Memtable capacity in keys.
    pub memtable_capacity: usize,

    /// Number of level files on disk.
    pub level_count: u64,

    /// Keys held by each level, ascending by level number.
    pub level_keys: Vec<u64>,
}

// ------------------------------------------------------------------------------------------------
// Engine Core
// ------------------------------------------------------------------------------------------------

/// The tiered LSM index.
///
/// See the [module-level documentation](self) for the layer structure and
/// guarantees.
#[derive(Debug)]
pub struct Engine {
    /// Directory holding the level files; exclusively owned.
    dir: PathBuf,

    /// In-memory sorted buffer of pending inserts.
    memtable: Memtable,

    /// Sizing policy.
    config: EngineConfig,
}

impl Engine {
    /// Opens an engine over `dir`, creating the directory if missing.
    ///
    /// No level metadata is read here; levels are found by filename
    /// existence as operations touch them, so opening an enormous index is
    /// as cheap as opening an empty one.
    pub fn open<P: AsRef<Path>>(dir: P, config: EngineConfig) -> Result<Self, EngineError> {
        let capacity = config.write_buffer_size / RECORD_SIZE as usize;
        if capacity == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "write_buffer_size ({} bytes) must hold at least one {RECORD_SIZE}-byte record",
                config.write_buffer_size
            )));
        }

        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        info!(
            dir = %dir.display(),
            capacity,
            level_growth = config.level_growth,
            "engine opened"
        );

        Ok(Self {
            dir,
            memtable: Memtable::new(capacity),
            config,
        })
    }

    /// Inserts `key` into the index.
    ///
    /// Flushes first when the memtable is full, then binary-searches the
    /// buffer for the insertion point. Inserting a key already buffered is
    /// a no-op; a key already on disk is buffered again and collapses with
    /// its older copy when a merge brings them together.
    pub fn insert(&mut self, key: Key) -> Result<(), EngineError> {
        if self.memtable.is_full() {
            self.flush()?;
        }

        let added = self.memtable.insert(key);
        trace!(key, added, "insert");
        Ok(())
    }

    /// Removes every occurrence of `key` from every layer.
    ///
    /// The memtable is purged first, then each existing level is searched
    /// and physically erased on hit. All levels are visited even after a
    /// hit: cascades deduplicate only pairwise, so the same key may sit on
    /// several levels at once.
    pub fn remove(&mut self, key: Key) -> Result<(), EngineError> {
        let buffered = self.memtable.remove(key);
        trace!(key, buffered, "remove");

        let mut level = 0;
        while self.level_exists(level) {
            let mut run = self.open_level(level)?;
            if let Some(index) = Self::search(&run, key)? {
                debug!(key, level, index, "erasing key from level");
                run.erase(index)?;
                run.sync()?;
            }
            level += 1;
        }

        Ok(())
    }

    /// Membership query: `true` iff `key` is in the memtable or on any
    /// level.
    ///
    /// Checks the memtable, then levels in ascending order, returning on
    /// the first hit.
    pub fn contains(&self, key: Key) -> Result<bool, EngineError> {
        if self.memtable.contains(key) {
            return Ok(true);
        }

        let mut level = 0;
        while self.level_exists(level) {
            let run = self.open_level(level)?;
            if Self::search(&run, key)?.is_some() {
                return Ok(true);
            }
            level += 1;
        }

        Ok(false)
    }

    /// Drains the memtable into `level0`, then cascades oversized levels.
    ///
    /// Each existing level is visited in ascending order; a level strictly
    /// above its threshold merges into its successor (created on demand)
    /// and is cleared. The walk stops at the first level within bounds,
    /// because deeper levels cannot have grown since the previous flush
    /// settled.
    ///
    /// A flush with an empty memtable is a no-op and creates no files.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if self.memtable.is_empty() {
            trace!("flush skipped, memtable empty");
            return Ok(());
        }

        debug!(keys = self.memtable.len(), "flushing memtable into level0");

        let mut level0 = self.open_level(0)?;
        merge::merge_into(&self.memtable, &mut level0)?;
        level0.sync()?;
        drop(level0);
        self.memtable.clear();

        let mut level = 0;
        while self.level_exists(level) {
            let mut from = self.open_level(level)?;
            let size = from.len()?;
            let threshold = self.threshold(level);
            if size <= threshold {
                break;
            }

            debug!(level, size, threshold, "cascading level into successor");

            let mut to = self.open_level(level + 1)?;
            merge::merge_into(&from, &mut to)?;
            to.sync()?;
            from.clear()?;
            from.sync()?;

            level += 1;
        }

        Ok(())
    }

    /// Gracefully shuts down the engine: flushes the memtable and fsyncs
    /// every level file.
    ///
    /// Dropping the engine also flushes, so `close` is only needed when the
    /// caller wants the I/O error instead of a log line.
    pub fn close(&mut self) -> Result<(), EngineError> {
        self.flush()?;

        let mut level = 0;
        while self.level_exists(level) {
            self.open_level(level)?.sync()?;
            level += 1;
        }

        info!(dir = %self.dir.display(), levels = level, "engine closed");
        Ok(())
    }

    /// Occupancy snapshot: memtable fill and per-level key counts.
    pub fn stats(&self) -> Result<EngineStats, EngineError> {
        let mut level_keys = Vec::new();
        let mut level = 0;
        while self.level_exists(level) {
            level_keys.push(self.open_level(level)?.len()?);
            level += 1;
        }

        Ok(EngineStats {
            memtable_keys: self.memtable.len(),
            memtable_capacity: self.memtable.capacity(),
            level_count: level,
            level_keys,
        })
    }

    /// Renders the full contents of every layer as text, memtable first.
    ///
    /// Diagnostic only; reads every record of every level.
    pub fn dump(&self) -> Result<String, EngineError> {
        let mut out = format!("Memtable: {}", self.memtable.len());
        if !self.memtable.is_empty() {
            out.push('\n');
        }
        for key in self.memtable.as_slice() {
            out.push_str(&format!("{key} "));
        }

        let mut level = 0;
        while self.level_exists(level) {
            let run = self.open_level(level)?;
            let len = run.len()?;
            out.push_str(&format!("\nLevel{level}: {len}"));
            if len > 0 {
                out.push('\n');
            }
            for i in 0..len {
                out.push_str(&format!("{} ", run.get(i)?));
            }
            level += 1;
        }

        Ok(out)
    }

    // --------------------------------------------------------------------------------------------
    // Level plumbing
    // --------------------------------------------------------------------------------------------

    /// Path of `level<n>` inside the engine directory.
    fn level_path(&self, level: u64) -> PathBuf {
        self.dir.join(format!("{LEVEL_FILE_PREFIX}{level}"))
    }

    /// Whether `level<n>` exists on disk. Levels are never deleted, so the
    /// existing ones always form a contiguous prefix.
    fn level_exists(&self, level: u64) -> bool {
        self.level_path(level).exists()
    }

    /// Opens a short-lived PSA view of `level<n>`, creating the file (with
    /// an empty header) on first touch.
    fn open_level(&self, level: u64) -> Result<PersistentSortedArray, PsaError> {
        PersistentSortedArray::open(self.level_path(level))
    }

    /// Size bound for `level<n>` in keys.
    fn threshold(&self, level: u64) -> u64 {
        self.config.level_growth * self.memtable.capacity() as u64 * (level + 1)
    }

    /// Binary search over a level's records. Returns the index of `key`,
    /// or `None` when absent.
    fn search(run: &PersistentSortedArray, key: Key) -> Result<Option<u64>, PsaError> {
        let mut lo = 0;
        let mut hi = run.len()?;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let probe = run.get(mid)?;

            if probe == key {
                return Ok(Some(mid));
            }
            if probe < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        Ok(None)
    }
}

impl Drop for Engine {
    /// Drains the memtable so orderly shutdown loses nothing. An I/O
    /// failure here can only be logged; callers that need the error should
    /// use [`Engine::close`].
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!(dir = %self.dir.display(), error = %e, "flush failed on drop");
        }
    }
}
