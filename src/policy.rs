//! Manual eviction policies.
//!
//! Expiry removes entries on time; these policies remove them on demand,
//! typically when the owner wants room before the table reports `Full`.
//!
//! | Policy          | Picks                                          | Walks        |
//! |-----------------|------------------------------------------------|--------------|
//! | `remove_oldest` | earliest expiry whose role is not protected    | expiry heap  |
//! | `evict_by_role` | every entry with the given role                | slot table   |
//! | `clear`         | every entry                                    | slot table   |
//!
//! ## remove_oldest
//!
//! Only the heap root is known to be minimal; the rest of heap storage is in
//! no useful order. The policy therefore pops the root repeatedly, setting
//! protected entries aside, until it reaches an unprotected one. Everything
//! set aside goes back into the heap unchanged.
//!
//! ```text
//!   heap (by expiry):   B(role 1) 3s,  A(role 0) 5s,  C(role 0) 9s
//!   protected = {1}
//!
//!   pop B ─► protected, set aside
//!   pop A ─► evict A (Deleted)
//!   restore B
//!
//!   heap:               B(role 1) 3s,  C(role 0) 9s
//! ```
//!
//! All evictions count as deletes and emit [`EventKind::Deleted`].

use std::fmt;

use log::debug;

use crate::ds::{Entry, HeapEntry};
use crate::event::EventKind;
use crate::scheduler::Timer;
use crate::table::MacTableCore;

/// Set of role tags, one bit per possible `u8` role.
///
/// # Example
///
/// ```
/// use mactable::policy::RoleSet;
///
/// let protected: RoleSet = [1, 7].into_iter().collect();
/// assert!(protected.contains(7));
/// assert!(!protected.contains(0));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet([u64; 4]);

impl RoleSet {
    /// The empty set; protects nothing.
    pub const EMPTY: RoleSet = RoleSet([0; 4]);

    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Set holding only `role`.
    pub fn single(role: u8) -> Self {
        let mut set = Self::EMPTY;
        set.insert(role);
        set
    }

    /// Adds `role`; returns `false` if it was already present.
    pub fn insert(&mut self, role: u8) -> bool {
        let (word, bit) = Self::locate(role);
        let was_set = self.0[word] & bit != 0;
        self.0[word] |= bit;
        !was_set
    }

    pub fn remove(&mut self, role: u8) -> bool {
        let (word, bit) = Self::locate(role);
        let was_set = self.0[word] & bit != 0;
        self.0[word] &= !bit;
        was_set
    }

    #[inline]
    pub fn contains(&self, role: u8) -> bool {
        let (word, bit) = Self::locate(role);
        self.0[word] & bit != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Roles in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|role| self.contains(*role))
    }

    #[inline]
    fn locate(role: u8) -> (usize, u64) {
        ((role >> 6) as usize, 1u64 << (role & 63))
    }
}

impl FromIterator<u8> for RoleSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = RoleSet::EMPTY;
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl From<&[u8]> for RoleSet {
    fn from(roles: &[u8]) -> Self {
        roles.iter().copied().collect()
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Timer> MacTableCore<T> {
    /// Evicts the entry with the earliest expiry among those whose role is
    /// not in `protected`.
    ///
    /// Returns `false` if the table is empty or every entry is protected; the
    /// table is then left unchanged.
    pub fn remove_oldest(&mut self, protected: &RoleSet) -> bool {
        let mut set_aside: Vec<HeapEntry> = Vec::new();
        let mut victim = None;

        while let Some(head) = self.queue.pop_min() {
            let Some(entry) = self.slots.get(head.slot) else {
                continue;
            };
            if protected.contains(entry.role) {
                set_aside.push(head);
                continue;
            }
            victim = Some(head.slot);
            break;
        }

        for entry in set_aside {
            self.queue.restore(entry);
        }

        let Some(slot) = victim else {
            debug!("remove_oldest: no unprotected entry (protected {protected:?})");
            self.resync_scheduler();
            return false;
        };
        self.vacate_slot(slot, EventKind::Deleted);
        self.resync_scheduler();
        true
    }

    /// Evicts every entry whose role is `role`. Returns the number evicted.
    pub fn evict_by_role(&mut self, role: u8) -> usize {
        self.evict_where(|entry| entry.role == role)
    }

    /// Evicts every entry. Returns the number evicted.
    pub fn clear(&mut self) -> usize {
        self.evict_where(|_| true)
    }

    /// Evicts every entry matching `pred`, scanning slots in index order.
    pub fn evict_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&Entry) -> bool,
    {
        let doomed: Vec<usize> = self
            .slots
            .iter_occupied()
            .filter(|(_, entry)| pred(entry))
            .map(|(slot, _)| slot)
            .collect();

        let evicted = doomed
            .into_iter()
            .filter(|&slot| self.vacate_slot(slot, EventKind::Deleted).is_some())
            .count();
        if evicted > 0 {
            debug!("evicted {evicted} entries");
        }
        self.resync_scheduler();
        evicted
    }
}
