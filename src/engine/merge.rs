//! In-place tail merge of two sorted runs.
//!
//! One routine serves both shapes of merge the engine performs: memtable
//! into a level, and level into the next level. The source side is abstracted
//! behind [`SortedSource`], a read-only capability the memtable satisfies
//! from memory and the PSA satisfies from disk.
//!
//! The destination is merged **in place**: its final length is computed
//! up front (duplicates across the two runs collapse to one copy), the
//! header is grown, and a single reverse pass writes each output slot from
//! the largest index down. Walking tail-first is what makes in-place safe:
//! the write cursor never descends below the destination's unread records,
//! so no scratch buffer or temporary file is needed.

use crate::Key;
use crate::memtable::Memtable;
use crate::psa::{PersistentSortedArray, PsaError};

/// Read-only view of a strictly ascending run of keys.
pub(crate) trait SortedSource {
    /// Number of keys in the run.
    fn len(&self) -> Result<u64, PsaError>;

    /// Key at `index`; must be below `len()`.
    fn get(&self, index: u64) -> Result<Key, PsaError>;
}

impl SortedSource for Memtable {
    fn len(&self) -> Result<u64, PsaError> {
        Ok(self.as_slice().len() as u64)
    }

    fn get(&self, index: u64) -> Result<Key, PsaError> {
        Ok(self.as_slice()[index as usize])
    }
}

impl SortedSource for PersistentSortedArray {
    fn len(&self) -> Result<u64, PsaError> {
        PersistentSortedArray::len(self)
    }

    fn get(&self, index: u64) -> Result<Key, PsaError> {
        PersistentSortedArray::get(self, index)
    }
}

/// Merges `src` into `dst`, leaving `dst` as the sorted union of the two
/// runs with cross-run duplicates collapsed to a single copy.
///
/// Both inputs must be strictly sorted ascending. `dst` is transiently
/// unsorted while the reverse pass runs; the caller must not expose it
/// until this function returns.
///
/// Cursor arithmetic is signed so `-1` can mark an exhausted side.
pub(crate) fn merge_into<S: SortedSource>(
    src: &S,
    dst: &mut PersistentSortedArray,
) -> Result<(), PsaError> {
    let src_len = src.len()?;
    let dst_len = dst.len()?;
    let merged_len = src_len + dst_len - count_duplicates(src, dst)?;

    dst.resize(merged_len)?;

    let mut l = src_len as i64 - 1;
    let mut r = dst_len as i64 - 1;
    let mut out = merged_len as i64 - 1;

    while l >= 0 {
        let s = src.get(l as u64)?;

        if r >= 0 {
            let d = dst.get(r as u64)?;
            if s <= d {
                // On a tie the destination copy is kept and both runs advance.
                if s == d {
                    l -= 1;
                }
                dst.set(out as u64, d)?;
                r -= 1;
                out -= 1;
                continue;
            }
        }

        dst.set(out as u64, s)?;
        l -= 1;
        out -= 1;
    }

    // Once the source is exhausted, dst[0..=r] was never overwritten and is
    // already in final position.
    Ok(())
}

/// Counts keys present in both runs via a forward two-pointer scan.
///
/// Runs before the merge so the output length is known without buffering
/// either side.
fn count_duplicates<S: SortedSource>(
    src: &S,
    dst: &PersistentSortedArray,
) -> Result<u64, PsaError> {
    let src_len = src.len()?;
    let dst_len = dst.len()?;

    let mut count = 0;
    let mut l = 0;
    let mut r = 0;

    while l < src_len && r < dst_len {
        let s = src.get(l)?;
        let d = dst.get(r)?;

        if s == d {
            count += 1;
            l += 1;
            r += 1;
        } else if s < d {
            l += 1;
        } else {
            r += 1;
        }
    }

    Ok(count)
}
