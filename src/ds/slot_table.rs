//! Fixed array of address slots with tombstone deletion.
//!
//! Storage half of the learning table: a boxed slice of `capacity` entries,
//! each `Empty`, `Occupied` or `Tombstone`, addressed by index. The table
//! never grows and never moves entries; a slot index stays valid for the
//! lifetime of the table, which is what lets the expiry heap refer to
//! entries by index.
//!
//! ## Architecture
//!
//! ```text
//!   home = fnv1a(addr) % capacity
//!
//!   index:   0      1      2      3      4      5
//!          ┌──────┬──────┬──────┬──────┬──────┬──────┐
//!          │  E   │  O:A │  T   │  O:B │  E   │  O:C │
//!          └──────┴──────┴──────┴──────┴──────┴──────┘
//!                    ▲ home(X)
//!                    └── find(X): 1 (A≠X) → 2 (skip T) → 3 (B≠X) → 4 (E, stop)
//!
//!   E = Empty   O = Occupied   T = Tombstone
//! ```
//!
//! ## Slot Lifecycle
//!
//! ```text
//!            occupy                     vacate
//!   Empty ───────────► Occupied ─────────────────► Tombstone
//!                        │  ▲                          │
//!                refresh └──┘        occupy            │
//!                        ▲─────────────────────────────┘
//! ```
//!
//! A tombstone never reverts to `Empty`; it keeps the probe chain intact for
//! keys placed past it and is reused by later insertions.
//!
//! ## Probing Rules
//!
//! - [`find`](SlotTable::find) stops at the first `Empty` slot or a matching
//!   occupied slot.
//! - [`probe_for_insert`](SlotTable::probe_for_insert) walks the whole cycle
//!   unless it hits the key or an `Empty` slot. An `Empty` slot wins over any
//!   tombstone seen before it; the first tombstone is claimed only when the
//!   cycle holds no `Empty` slot.

use crate::address::MacAddress;
use crate::ds::probe::ProbeSeq;
use crate::error::ConfigError;
use crate::time::Timestamp;

/// State of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SlotState {
    /// Never used since construction.
    #[default]
    Empty,
    /// Vacated by delete, expiry or eviction; reusable.
    Tombstone,
    /// Holds a live entry.
    Occupied,
}

/// One slot of the table.
///
/// `address`, `expires_at` and `role` are meaningful only while `state` is
/// [`SlotState::Occupied`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Entry {
    pub address: MacAddress,
    pub expires_at: Timestamp,
    pub role: u8,
    pub state: SlotState,
}

impl Entry {
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.state == SlotState::Occupied
    }
}

/// Result of probing for an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertProbe {
    /// The key is already stored at this slot.
    Found(usize),
    /// The key is absent; this slot may be claimed.
    Vacant(usize),
    /// No `Empty` or `Tombstone` slot exists.
    Full,
}

/// Fixed-capacity open-addressed slot storage.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Box<[Entry]>,
}

impl SlotTable {
    /// Allocates `capacity` empty slots.
    ///
    /// Fails if `capacity` is zero or the allocation cannot be satisfied.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("capacity must be greater than zero"));
        }
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|e| ConfigError::new(format!("cannot allocate {capacity} slots: {e}")))?;
        slots.resize(capacity, Entry::default());
        Ok(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Raw slot at `index`, whatever its state.
    #[inline]
    pub fn slot(&self, index: usize) -> Option<&Entry> {
        self.slots.get(index)
    }

    /// Entry at `index` if that slot is occupied.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.slots.get(index).filter(|e| e.is_occupied())
    }

    /// Index of the occupied slot holding `address`.
    pub fn find(&self, address: &MacAddress) -> Option<usize> {
        for idx in ProbeSeq::new(address, self.capacity()) {
            let slot = &self.slots[idx];
            match slot.state {
                SlotState::Empty => return None,
                SlotState::Occupied if slot.address == *address => return Some(idx),
                _ => {},
            }
        }
        None
    }

    /// Locates the slot an insertion of `address` should use.
    pub fn probe_for_insert(&self, address: &MacAddress) -> InsertProbe {
        let mut first_tombstone = None;
        for idx in ProbeSeq::new(address, self.capacity()) {
            let slot = &self.slots[idx];
            match slot.state {
                SlotState::Occupied if slot.address == *address => {
                    return InsertProbe::Found(idx);
                },
                SlotState::Occupied => {},
                SlotState::Empty => return InsertProbe::Vacant(idx),
                SlotState::Tombstone => {
                    first_tombstone.get_or_insert(idx);
                },
            }
        }
        first_tombstone.map_or(InsertProbe::Full, InsertProbe::Vacant)
    }

    /// Stores a new entry in a non-occupied slot.
    pub fn occupy(&mut self, index: usize, address: MacAddress, expires_at: Timestamp, role: u8) {
        let slot = &mut self.slots[index];
        debug_assert!(!slot.is_occupied(), "slot {index} already occupied");
        *slot = Entry {
            address,
            expires_at,
            role,
            state: SlotState::Occupied,
        };
    }

    /// Updates expiry and role of an occupied slot in place.
    pub fn refresh(&mut self, index: usize, expires_at: Timestamp, role: u8) {
        let slot = &mut self.slots[index];
        debug_assert!(slot.is_occupied(), "refresh of vacant slot {index}");
        slot.expires_at = expires_at;
        slot.role = role;
    }

    /// Turns an occupied slot into a tombstone and returns the entry it held.
    pub fn vacate(&mut self, index: usize) -> Option<Entry> {
        let slot = self.slots.get_mut(index).filter(|e| e.is_occupied())?;
        let entry = *slot;
        slot.state = SlotState::Tombstone;
        Some(entry)
    }

    /// Occupied slots in index order.
    pub fn iter_occupied(&self) -> impl Iterator<Item = (usize, &Entry)> + '_ {
        self.slots.iter().enumerate().filter(|(_, e)| e.is_occupied())
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|e| e.is_occupied()).count()
    }

    pub fn tombstone_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|e| e.state == SlotState::Tombstone)
            .count()
    }
}
