//! Single-threaded MAC learning table engine.
//!
//! [`MacTableCore`] owns the slot table, the expiry heap, the counters, the
//! event sink and the expiry scheduler, and keeps all five in lockstep: every
//! public operation leaves the heap holding exactly one entry per occupied
//! slot, the counters matching the slot states, and the timer armed for the
//! earliest expiry.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────────┐
//!   │                         MacTableCore<T: Timer>                         │
//!   │                                                                        │
//!   │   slots: SlotTable            queue: ExpiryHeap                        │
//!   │   ┌────┬────┬────┬────┐       ┌──────────────────────┐                 │
//!   │   │ O:A│ T  │ O:B│ E  │ ◄──── │ (slot 2, 12s)  root  │                 │
//!   │   └────┴────┴────┴────┘       │ (slot 0, 40s)        │                 │
//!   │     ▲                         └──────────┬───────────┘                 │
//!   │     │ stale-pop guard                    │ peek_min                    │
//!   │     │ (slot still O with                 ▼                             │
//!   │     │  the same expiry?)      scheduler: ExpiryScheduler<T>            │
//!   │     │                           Idle | Armed(12s) ──► T::arm(12s)      │
//!   │     └──────────────── fire() ◄──────────── timer reaches 12s           │
//!   │                                                                        │
//!   │   stats: TableStats     sink: Box<dyn EventSink>    clock: Arc<dyn Clock>
//!   └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operation Flow
//!
//! ```text
//!   insert(addr)                       fire()
//!     │                                  │
//!     ▼                                  ▼
//!   probe_for_insert ── Found ─► refresh     pop every entry with expiry ≤ now
//!     │    │                 + upsert         │
//!     │    └─ Vacant ─► occupy + upsert       ├─ slot O, same expiry ─► Timeout
//!     │                 + stats               └─ otherwise ───────────► discard
//!     └─ Full ──► event only                  │
//!     │                                       ▼
//!     ▼                                     resync scheduler
//!   resync scheduler
//! ```
//!
//! ## Thread Safety
//!
//! `MacTableCore` is not thread-safe. [`MacTable`](crate::concurrent::MacTable)
//! wraps it in a mutex and drives [`fire`](MacTableCore::fire) from a worker
//! thread.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use rustc_hash::FxHashSet;

use crate::address::MacAddress;
use crate::ds::{Entry, ExpiryHeap, InsertProbe, SlotTable};
use crate::error::{ConfigError, InvariantError};
use crate::event::{EventKind, EventSink};
use crate::scheduler::{ExpiryScheduler, SchedulerState, Timer};
use crate::stats::TableStats;
use crate::time::{Clock, Timestamp};

/// Role given to entries inserted without one.
pub const DEFAULT_ROLE: u8 = 0;

/// Per-insert overrides.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use mactable::table::InsertOptions;
///
/// let opts = InsertOptions::new().with_ttl(Duration::from_secs(30)).with_role(2);
/// assert_eq!(opts.role, Some(2));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Lifetime of the entry; the table default when `None`.
    pub ttl: Option<Duration>,
    /// Role tag; [`DEFAULT_ROLE`] when `None`.
    pub role: Option<u8>,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_role(mut self, role: u8) -> Self {
        self.role = Some(role);
        self
    }
}

/// Result of an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertOutcome {
    /// A new entry was stored at this slot.
    Inserted(usize),
    /// The existing entry at this slot was refreshed.
    Updated(usize),
    /// No free slot; nothing changed.
    Full,
}

impl InsertOutcome {
    /// Slot touched by the insertion.
    pub fn slot(&self) -> Option<usize> {
        match self {
            InsertOutcome::Inserted(slot) | InsertOutcome::Updated(slot) => Some(*slot),
            InsertOutcome::Full => None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, InsertOutcome::Full)
    }
}

/// Fixed-capacity MAC table with TTL expiry, driven by a [`Timer`].
pub struct MacTableCore<T: Timer> {
    pub(crate) slots: SlotTable,
    pub(crate) queue: ExpiryHeap,
    pub(crate) stats: TableStats,
    default_ttl: Duration,
    sink: Box<dyn EventSink>,
    clock: Arc<dyn Clock>,
    scheduler: ExpiryScheduler<T>,
}

impl<T: Timer> MacTableCore<T> {
    /// Allocates a table of `capacity` empty slots.
    ///
    /// Slot storage and the expiry heap are both reserved here; if either
    /// reservation fails nothing is kept.
    pub fn try_new(
        capacity: usize,
        default_ttl: Duration,
        sink: Box<dyn EventSink>,
        clock: Arc<dyn Clock>,
        timer: T,
    ) -> Result<Self, ConfigError> {
        let slots = SlotTable::try_with_capacity(capacity)?;
        let queue = ExpiryHeap::try_with_capacity(capacity)?;
        debug!("mac table created: capacity={capacity} default_ttl={default_ttl:?}");
        Ok(Self {
            slots,
            queue,
            stats: TableStats::default(),
            default_ttl,
            sink,
            clock,
            scheduler: ExpiryScheduler::new(timer),
        })
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Inserts or refreshes `address` with the default TTL and role.
    pub fn insert(&mut self, address: MacAddress) -> InsertOutcome {
        self.insert_with(address, InsertOptions::default())
    }

    /// Inserts or refreshes `address`.
    ///
    /// A known address keeps its slot; its expiry becomes `now + ttl` and its
    /// role is overwritten. A new address takes the first `Empty` slot on its
    /// probe sequence, or the first tombstone if the sequence has no `Empty`
    /// slot.
    pub fn insert_with(&mut self, address: MacAddress, opts: InsertOptions) -> InsertOutcome {
        let expires_at = self.clock.now() + opts.ttl.unwrap_or(self.default_ttl);
        let role = opts.role.unwrap_or(DEFAULT_ROLE);

        let outcome = match self.slots.probe_for_insert(&address) {
            InsertProbe::Found(slot) => {
                self.slots.refresh(slot, expires_at, role);
                self.queue.upsert(slot, expires_at);
                self.emit(Some(slot), &address, EventKind::Updated);
                InsertOutcome::Updated(slot)
            },
            InsertProbe::Vacant(slot) => {
                self.slots.occupy(slot, address, expires_at, role);
                self.queue.upsert(slot, expires_at);
                self.stats.record_insert();
                self.emit(Some(slot), &address, EventKind::Inserted);
                InsertOutcome::Inserted(slot)
            },
            InsertProbe::Full => {
                self.emit(None, &address, EventKind::Full);
                InsertOutcome::Full
            },
        };
        self.resync_scheduler();
        outcome
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Whether `address` is stored. Entries past their expiry still count
    /// until the timer purges them.
    pub fn exists(&self, address: &MacAddress) -> bool {
        self.slots.find(address).is_some()
    }

    /// Slot and a copy of the entry stored for `address`.
    pub fn lookup(&self, address: &MacAddress) -> Option<(usize, Entry)> {
        let slot = self.slots.find(address)?;
        self.slots.get(slot).map(|entry| (slot, *entry))
    }

    /// Copy of the entry at `index` if that slot is occupied.
    pub fn get_by_index(&self, index: usize) -> Option<Entry> {
        self.slots.get(index).copied()
    }

    /// Occupied slots in index order.
    pub fn entries(&self) -> Vec<(usize, Entry)> {
        self.slots
            .iter_occupied()
            .map(|(slot, entry)| (slot, *entry))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Removes `address`. Returns the slot it occupied.
    pub fn delete(&mut self, address: &MacAddress) -> Option<usize> {
        let slot = self.slots.find(address)?;
        self.delete_by_index(slot).map(|_| slot)
    }

    /// Removes the entry at `index`. Returns the removed entry, or `None` if
    /// the slot was not occupied.
    pub fn delete_by_index(&mut self, index: usize) -> Option<Entry> {
        let entry = self.vacate_slot(index, EventKind::Deleted)?;
        self.resync_scheduler();
        Some(entry)
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    /// Purges every entry whose expiry is at or before the clock's now.
    ///
    /// Called when the armed timer goes off. Queue entries whose slot was
    /// vacated or refreshed since they were queued are discarded. Returns the
    /// number of entries purged.
    pub fn fire(&mut self) -> usize {
        let now = self.clock.now();
        self.scheduler.fired();

        let mut expired = 0;
        while self.queue.peek_min().is_some_and(|at| at <= now) {
            let Some(due) = self.queue.pop_min() else {
                break;
            };
            let current = self.slots.get(due.slot).map(|e| e.expires_at);
            if current != Some(due.expires_at) {
                trace!("discarding stale expiry for slot {} at {}", due.slot, due.expires_at);
                continue;
            }
            if let Some(entry) = self.slots.vacate(due.slot) {
                self.stats.record_expired();
                self.emit(Some(due.slot), &entry.address, EventKind::Timeout);
                expired += 1;
            }
        }

        self.resync_scheduler();
        expired
    }

    /// Earliest queued expiry.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.peek_min()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// The timer this table arms.
    pub fn timer(&self) -> &T {
        self.scheduler.timer()
    }

    // -----------------------------------------------------------------------
    // Stats and configuration
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Zeroes the insert, delete and expiry totals.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.stats.active_entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Current time according to the table's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Cross-checks slots, expiry queue, counters and scheduler.
    ///
    /// - no address is stored twice
    /// - the queue holds exactly one entry per occupied slot, with the slot's
    ///   expiry, and is heap-ordered
    /// - `active_entries` equals the number of occupied slots
    /// - the scheduler is armed for the queue minimum, or idle if empty
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut seen = FxHashSet::default();
        let mut occupied = 0usize;
        for (slot, entry) in self.slots.iter_occupied() {
            occupied += 1;
            if !seen.insert(entry.address) {
                return Err(InvariantError::new(format!(
                    "address {} stored more than once (again at slot {slot})",
                    entry.address
                )));
            }
            match self.queue.expiry_of(slot) {
                Some(at) if at == entry.expires_at => {},
                Some(at) => {
                    return Err(InvariantError::new(format!(
                        "slot {slot} expires at {} but is queued for {at}",
                        entry.expires_at
                    )));
                },
                None => {
                    return Err(InvariantError::new(format!(
                        "occupied slot {slot} missing from expiry queue"
                    )));
                },
            }
        }

        if self.queue.len() != occupied {
            return Err(InvariantError::new(format!(
                "expiry queue has {} entries for {occupied} occupied slots",
                self.queue.len()
            )));
        }
        if let Some(pos) = self.queue.find_order_violation() {
            return Err(InvariantError::new(format!(
                "expiry queue out of order at position {pos}"
            )));
        }
        if self.stats.active_entries != occupied {
            return Err(InvariantError::new(format!(
                "active_entries is {} but {occupied} slots are occupied",
                self.stats.active_entries
            )));
        }
        if self.scheduler.state().deadline() != self.queue.peek_min() {
            return Err(InvariantError::new(format!(
                "scheduler {:?} does not track queue minimum {:?}",
                self.scheduler.state(),
                self.queue.peek_min()
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals shared with the eviction policies
    // -----------------------------------------------------------------------

    /// Tombstones `slot`, drops its queue entry, counts and reports it.
    /// Leaves the scheduler for the caller to resync.
    pub(crate) fn vacate_slot(&mut self, slot: usize, kind: EventKind) -> Option<Entry> {
        let entry = self.slots.vacate(slot)?;
        self.queue.remove(slot);
        match kind {
            EventKind::Timeout => self.stats.record_expired(),
            _ => self.stats.record_delete(),
        }
        self.emit(Some(slot), &entry.address, kind);
        Some(entry)
    }

    pub(crate) fn resync_scheduler(&mut self) {
        self.scheduler.sync(self.queue.peek_min());
    }

    pub(crate) fn emit(&self, slot: Option<usize>, address: &MacAddress, kind: EventKind) {
        match slot {
            Some(slot) => debug!("{address} {} at slot {slot}", kind.as_str()),
            None => warn!("mac table full, rejected {address}"),
        }
        self.sink.on_event(slot, address, kind);
    }
}

impl<T: Timer> fmt::Debug for MacTableCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacTableCore")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("default_ttl", &self.default_ttl)
            .field("stats", &self.stats)
            .field("scheduler", &self.scheduler.state())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
