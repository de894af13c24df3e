//! # Memtable Module
//!
//! ## Design Invariants
//!
//! - Keys are held strictly sorted ascending; a duplicate insert is a no-op.
//! - Capacity is fixed at construction; the memtable never grows past it.
//!   The engine flushes *before* inserting into a full buffer, so `insert`
//!   itself cannot overflow.
//! - All operations are in-memory and infallible.
//!
//! ## Flush Semantics
//!
//! The memtable does not write itself out. The engine reads it through the
//! merge machinery (it is one of the sorted sources a level can absorb) and
//! calls [`Memtable::clear`] once the level holds the data.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use crate::Key;

// ------------------------------------------------------------------------------------------------
// Memtable Core
// ------------------------------------------------------------------------------------------------

/// The mutable, in-memory write buffer of the engine.
///
/// A bounded sorted vector of distinct keys. Insertion keeps the vector
/// sorted via binary search, which makes membership O(log n) and makes the
/// buffer directly mergeable into an on-disk level without a sort pass.
#[derive(Debug)]
pub struct Memtable {
    /// Strictly ascending keys.
    keys: Vec<Key>,

    /// Maximum number of keys before the engine must flush.
    capacity: usize,
}

impl Memtable {
    /// Creates an empty memtable that holds at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts `key` preserving sort order.
    ///
    /// Returns `true` when the key was added, `false` when it was already
    /// present. Callers must check [`Memtable::is_full`] first.
    pub fn insert(&mut self, key: Key) -> bool {
        debug_assert!(!self.is_full(), "insert into full memtable");

        match self.keys.binary_search(&key) {
            Ok(_) => false,
            Err(pos) => {
                self.keys.insert(pos, key);
                true
            }
        }
    }

    /// Removes `key` if present. Returns `true` when a key was removed.
    pub fn remove(&mut self, key: Key) -> bool {
        match self.keys.binary_search(&key) {
            Ok(pos) => {
                self.keys.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Membership test via binary search.
    pub fn contains(&self, key: Key) -> bool {
        self.keys.binary_search(&key).is_ok()
    }

    /// Number of buffered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when no keys are buffered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `true` when the buffer has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.keys.len() == self.capacity
    }

    /// Configured maximum number of keys.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all buffered keys, keeping the allocation.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// The buffered keys in ascending order.
    pub fn as_slice(&self) -> &[Key] {
        &self.keys
    }
}
