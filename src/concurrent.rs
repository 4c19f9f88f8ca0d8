//! Thread-safe MAC table with a background expiry worker.
//!
//! [`MacTable`] puts a [`MacTableCore`] behind one `parking_lot::Mutex`.
//! Application calls and timer fires take the same lock, so expiry purges
//! are serialized with inserts, deletes and evictions, and the timer is
//! always armed from the state the last mutation left behind.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────── Arc<Shared> ────────────────────────────┐
//!   │                                                                     │
//!   │   core: Mutex<MacTableCore<Box<dyn Timer>>>                         │
//!   │   wake: Arc<Condvar>  ◄── CondvarTimer::arm / disarm                │
//!   │   shutdown: AtomicBool                                              │
//!   └─────────────────────────────────────────────────────────────────────┘
//!          ▲                                        ▲
//!          │ lock                                   │ lock + wait_for
//!   ┌──────┴───────┐                      ┌─────────┴─────────────────┐
//!   │ caller       │                      │ "mactable-expiry" thread  │
//!   │ insert/delete│                      │  Idle       → wait        │
//!   │ evict/...    │                      │  Armed(t>now)→ wait_for   │
//!   └──────────────┘                      │  Armed(t≤now)→ fire()     │
//!                                         └───────────────────────────┘
//! ```
//!
//! The worker sleeps on the condvar with the table mutex released. Arming
//! the timer notifies it, and it re-reads the scheduler state on every
//! wake-up, so a new earlier deadline shortens its sleep.
//!
//! Without a worker ([`MacTableBuilder::spawn_worker(false)`]), the host
//! calls [`MacTable::fire`] itself once [`MacTable::next_deadline`] passes.
//!
//! [`MacTableBuilder::spawn_worker(false)`]: crate::builder::MacTableBuilder::spawn_worker

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error};
use parking_lot::{Condvar, Mutex};

use crate::address::MacAddress;
use crate::builder::MacTableBuilder;
use crate::ds::Entry;
use crate::error::{ConfigError, InvariantError};
use crate::event::EventSink;
use crate::policy::RoleSet;
use crate::scheduler::{SchedulerState, Timer};
use crate::stats::TableStats;
use crate::table::{InsertOptions, InsertOutcome, MacTableCore};
use crate::time::Timestamp;

const WORKER_NAME: &str = "mactable-expiry";

struct Shared {
    core: Mutex<MacTableCore<Box<dyn Timer>>>,
    wake: Arc<Condvar>,
    shutdown: AtomicBool,
}

/// Thread-safe MAC learning table.
///
/// All methods take `&self`; share the table across threads with an `Arc`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use mactable::{MacAddress, MacTable, InsertOutcome};
/// use mactable::event::NoopSink;
///
/// let table = MacTable::new(64, Duration::from_secs(300), NoopSink).unwrap();
/// let addr: MacAddress = "00:1a:2b:3c:4d:5e".parse().unwrap();
///
/// assert!(matches!(table.insert(addr), InsertOutcome::Inserted(_)));
/// assert!(table.exists(&addr));
/// assert_eq!(table.stats().active_entries, 1);
/// ```
pub struct MacTable {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl MacTable {
    /// Creates a table with a monotonic clock and a background expiry
    /// worker.
    pub fn new(
        capacity: usize,
        default_ttl: Duration,
        sink: impl EventSink + 'static,
    ) -> Result<Self, ConfigError> {
        MacTableBuilder::new(capacity)
            .default_ttl(default_ttl)
            .event_sink(sink)
            .try_build()
    }

    pub fn builder(capacity: usize) -> MacTableBuilder {
        MacTableBuilder::new(capacity)
    }

    /// Wraps `core`, optionally starting the expiry worker.
    ///
    /// `wake` must be the condvar the core's timer notifies.
    pub(crate) fn from_core(
        core: MacTableCore<Box<dyn Timer>>,
        wake: Arc<Condvar>,
        spawn_worker: bool,
    ) -> Result<Self, ConfigError> {
        let shared = Arc::new(Shared {
            core: Mutex::new(core),
            wake,
            shutdown: AtomicBool::new(false),
        });

        let worker = if spawn_worker {
            let worker_shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(WORKER_NAME.to_string())
                .spawn(move || run_worker(&worker_shared))
                .map_err(|e| ConfigError::new(format!("cannot spawn expiry worker: {e}")))?;
            Some(handle)
        } else {
            None
        };

        Ok(Self { shared, worker })
    }

    // -----------------------------------------------------------------------
    // Table operations
    // -----------------------------------------------------------------------

    pub fn insert(&self, address: MacAddress) -> InsertOutcome {
        self.shared.core.lock().insert(address)
    }

    pub fn insert_with(&self, address: MacAddress, opts: InsertOptions) -> InsertOutcome {
        self.shared.core.lock().insert_with(address, opts)
    }

    pub fn exists(&self, address: &MacAddress) -> bool {
        self.shared.core.lock().exists(address)
    }

    pub fn lookup(&self, address: &MacAddress) -> Option<(usize, Entry)> {
        self.shared.core.lock().lookup(address)
    }

    pub fn get_by_index(&self, index: usize) -> Option<Entry> {
        self.shared.core.lock().get_by_index(index)
    }

    pub fn delete(&self, address: &MacAddress) -> Option<usize> {
        self.shared.core.lock().delete(address)
    }

    pub fn delete_by_index(&self, index: usize) -> Option<Entry> {
        self.shared.core.lock().delete_by_index(index)
    }

    pub fn remove_oldest(&self, protected: &RoleSet) -> bool {
        self.shared.core.lock().remove_oldest(protected)
    }

    pub fn evict_by_role(&self, role: u8) -> usize {
        self.shared.core.lock().evict_by_role(role)
    }

    pub fn clear(&self) -> usize {
        self.shared.core.lock().clear()
    }

    pub fn entries(&self) -> Vec<(usize, Entry)> {
        self.shared.core.lock().entries()
    }

    /// Purges due entries now. Needed only when no worker was spawned.
    pub fn fire(&self) -> usize {
        self.shared.core.lock().fire()
    }

    pub fn stats(&self) -> TableStats {
        self.shared.core.lock().stats()
    }

    pub fn reset_stats(&self) {
        self.shared.core.lock().reset_stats();
    }

    pub fn len(&self) -> usize {
        self.shared.core.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.core.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.core.lock().capacity()
    }

    pub fn default_ttl(&self) -> Duration {
        self.shared.core.lock().default_ttl()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.shared.core.lock().next_deadline()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.shared.core.lock().scheduler_state()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.shared.core.lock().check_invariants()
    }

    /// Runs `f` with the table locked, for several operations that must not
    /// interleave with others or with expiry.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut MacTableCore<Box<dyn Timer>>) -> R) -> R {
        f(&mut self.shared.core.lock())
    }

    // -----------------------------------------------------------------------
    // Worker lifecycle
    // -----------------------------------------------------------------------

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Stops and joins the expiry worker. Entries stay in the table but no
    /// longer expire on their own. Called automatically on drop.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        {
            let _core = self.shared.core.lock();
            self.shared.shutdown.store(true, Ordering::Release);
            self.shared.wake.notify_all();
        }
        if handle.join().is_err() {
            error!("{WORKER_NAME} thread panicked");
        }
        debug!("{WORKER_NAME} thread stopped");
    }
}

impl Drop for MacTable {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for MacTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacTable")
            .field("core", &*self.shared.core.lock())
            .field("worker", &self.worker.is_some())
            .finish()
    }
}

fn run_worker(shared: &Shared) {
    debug!("{WORKER_NAME} thread started");
    let mut core = shared.core.lock();
    while !shared.shutdown.load(Ordering::Acquire) {
        match core.scheduler_state() {
            SchedulerState::Idle => shared.wake.wait(&mut core),
            SchedulerState::Armed(deadline) => {
                let now = core.now();
                if deadline <= now {
                    core.fire();
                } else {
                    let _ = shared.wake.wait_for(&mut core, now.duration_until(deadline));
                }
            },
        }
    }
}
