//! # strataset
//!
//! An embeddable, persistent sorted index of 64-bit keys built on a
//! **tiered Log-Structured Merge (LSM)** architecture. Designed for
//! cheap buffered writes and bounded on-disk levels.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                     Engine                         │
//! │  ┌────────────┐   ┌──────────┐   ┌──────────┐     │
//! │  │  Memtable   │   │  level0  │   │  level1  │ …  │
//! │  │ (in memory) │   │ (on disk)│   │ (on disk)│     │
//! │  └─────┬───────┘   └────┬─────┘   └────┬─────┘     │
//! │        │   flush        │   cascade    │           │
//! │        └─────────►      └──────────►   │           │
//! │                                                    │
//! │  each level is a PersistentSortedArray: a length-  │
//! │  prefixed file of sorted u64 records               │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Core index — open, insert, remove, contains, flush, cascade |
//! | [`memtable`] | Bounded, sorted, duplicate-free in-memory write buffer |
//! | [`psa`] | File-backed random-access array with a durable length prefix |
//!
//! ## Key Features
//!
//! - **Buffered writes** — inserts land in a sorted in-memory buffer and
//!   reach disk in bulk when the buffer fills.
//! - **Tiered levels** — each on-disk level is a single sorted run; a level
//!   that outgrows its size threshold is merged into the next one.
//! - **In-place merges** — a level absorbs its predecessor through a
//!   tail-first merge that needs no scratch file and collapses duplicates.
//! - **Physical deletes** — `remove` erases the key from every layer it
//!   appears on; there are no tombstones to compact away.
//! - **Flush on drop** — dropping the engine drains the buffer, so orderly
//!   shutdown never loses an acknowledged insert.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strataset::engine::{Engine, EngineConfig};
//!
//! let mut index = Engine::open("/tmp/my_index", EngineConfig::default()).unwrap();
//!
//! // Write
//! index.insert(42).unwrap();
//!
//! // Membership
//! assert!(index.contains(42).unwrap());
//! assert!(!index.contains(7).unwrap());
//!
//! // Delete
//! index.remove(42).unwrap();
//! assert!(!index.contains(42).unwrap());
//!
//! // Graceful shutdown (also happens on drop)
//! index.close().unwrap();
//! ```

pub mod engine;
pub mod memtable;
pub mod psa;

/// The sole payload type: keys are plain 64-bit unsigned integers,
/// compared numerically.
pub type Key = u64;
