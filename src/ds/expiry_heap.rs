//! Binary min-heap of slot expiry times.
//!
//! Unlike a lazy heap that leaves stale entries behind, this heap is kept
//! exact: each slot index appears at most once, and an update or removal
//! physically rewrites the heap. The heap length is bounded by the table
//! capacity and the owner can check that queue and slot table agree entry
//! for entry.
//!
//! ## Architecture
//!
//! ```text
//!   entries: Vec<HeapEntry>   (array-backed binary heap)
//!
//!                    [0] slot 4 @ 10.000s
//!                   /                    \
//!        [1] slot 0 @ 12.000s      [2] slot 7 @ 30.000s
//!          /            \
//!   [3] slot 2 @ 15s  [4] slot 1 @ 13s
//!
//!   parent(i) = (i - 1) / 2      children(i) = 2i + 1, 2i + 2
//! ```
//!
//! ## Removal by Slot
//!
//! ```text
//!   remove(slot 0):
//!     1. linear scan      → position 1
//!     2. swap with last   → [1] = slot 1 @ 13s, pop tail
//!     3. sift up, then sift down from position 1
//! ```
//!
//! Both sifts are needed: the element moved into the hole may be smaller than
//! its new parent or larger than its new children.
//!
//! ## Operations
//!
//! | Operation   | Complexity | Notes                                |
//! |-------------|------------|--------------------------------------|
//! | `upsert`    | O(n)       | Linear scan for the old entry        |
//! | `remove`    | O(n)       | Linear scan, then O(log n) sifts     |
//! | `peek_min`  | O(1)       |                                      |
//! | `pop_min`   | O(log n)   |                                      |
//! | `restore`   | O(log n)   | Re-inserts a popped entry unchanged  |
//!
//! Equal expiry times pop in the order they were queued.

use std::cmp::Ordering;

use crate::error::ConfigError;
use crate::time::Timestamp;

/// One queued expiry: a weak back-reference to a table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapEntry {
    pub slot: usize,
    pub expires_at: Timestamp,
    seq: u64,
}

impl HeapEntry {
    #[inline]
    fn key(&self) -> (Timestamp, u64) {
        (self.expires_at, self.seq)
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Exact min-heap keyed by expiry time, at most one entry per slot.
#[derive(Debug, Clone)]
pub struct ExpiryHeap {
    entries: Vec<HeapEntry>,
    capacity: usize,
    seq: u64,
}

impl ExpiryHeap {
    /// Reserves room for `capacity` entries up front.
    ///
    /// The heap never reallocates afterwards, so a failure here is the only
    /// allocation failure the heap can produce.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity).map_err(|e| {
            ConfigError::new(format!("cannot allocate expiry queue for {capacity} slots: {e}"))
        })?;
        Ok(Self {
            entries,
            capacity,
            seq: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Position of `slot` in heap storage.
    pub fn position_of(&self, slot: usize) -> Option<usize> {
        self.entries.iter().position(|e| e.slot == slot)
    }

    /// Queued expiry of `slot`.
    pub fn expiry_of(&self, slot: usize) -> Option<Timestamp> {
        self.position_of(slot).map(|pos| self.entries[pos].expires_at)
    }

    /// Queues `slot` to expire at `expires_at`, replacing any previous entry
    /// for the same slot. Returns the replaced expiry.
    pub fn upsert(&mut self, slot: usize, expires_at: Timestamp) -> Option<Timestamp> {
        debug_assert!(slot < self.capacity, "slot {slot} out of range");
        let previous = self.remove(slot);
        let entry = HeapEntry {
            slot,
            expires_at,
            seq: self.next_seq(),
        };
        self.push(entry);
        previous
    }

    /// Drops the entry for `slot`. Returns its expiry, or `None` if absent.
    pub fn remove(&mut self, slot: usize) -> Option<Timestamp> {
        let pos = self.position_of(slot)?;
        let removed = self.entries.swap_remove(pos);
        if pos < self.entries.len() {
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }
        Some(removed.expires_at)
    }

    /// Earliest queued expiry.
    #[inline]
    pub fn peek_min(&self) -> Option<Timestamp> {
        self.entries.first().map(|e| e.expires_at)
    }

    /// Root entry without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&HeapEntry> {
        self.entries.first()
    }

    /// Removes and returns the root entry.
    pub fn pop_min(&mut self) -> Option<HeapEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let root = self.entries.swap_remove(0);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some(root)
    }

    /// Puts back an entry previously returned by [`pop_min`](Self::pop_min),
    /// keeping its original tie-break position.
    pub fn restore(&mut self, entry: HeapEntry) {
        debug_assert!(self.position_of(entry.slot).is_none());
        self.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in heap storage order (only the first is guaranteed minimal).
    pub fn iter(&self) -> impl Iterator<Item = &HeapEntry> + '_ {
        self.entries.iter()
    }

    /// Index of the first entry that orders before its parent.
    pub fn find_order_violation(&self) -> Option<usize> {
        (1..self.entries.len()).find(|&i| self.entries[i] < self.entries[(i - 1) / 2])
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.entries.len() <= self.capacity);
        assert_eq!(self.find_order_violation(), None);
        let mut slots: Vec<usize> = self.entries.iter().map(|e| e.slot).collect();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), self.entries.len(), "duplicate slot in heap");
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    fn push(&mut self, entry: HeapEntry) {
        debug_assert!(self.entries.len() < self.capacity, "expiry heap overflow");
        self.entries.push(entry);
        self.sift_up(self.entries.len() - 1);
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos] >= self.entries[parent] {
                break;
            }
            self.entries.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.entries[right] < self.entries[left] {
                right
            } else {
                left
            };
            if self.entries[child] >= self.entries[pos] {
                break;
            }
            self.entries.swap(pos, child);
            pos = child;
        }
    }
}
