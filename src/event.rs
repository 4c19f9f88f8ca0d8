//! Table event notification.
//!
//! Every mutation of the table (and every rejected insertion) is reported to
//! an [`EventSink`] held by the table for its whole lifetime. The sink is
//! invoked synchronously, in the execution context that performed the
//! mutation, after the slot table, expiry queue and counters have been
//! updated.
//!
//! ## Event Flow
//!
//! ```text
//!   insert(new key)      ──► Inserted(slot)
//!   insert(known key)    ──► Updated(slot)
//!   insert(table full)   ──► Full(None)
//!   delete / eviction    ──► Deleted(slot)
//!   expiry timer fired   ──► Timeout(slot)
//! ```
//!
//! Sinks run while the table is locked; a sink must not call back into the
//! same table.

use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::address::MacAddress;

/// Kind of table event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A new key claimed an empty or tombstoned slot.
    Inserted,
    /// An existing key was refreshed in place.
    Updated,
    /// An entry was removed by delete or by an eviction policy.
    Deleted,
    /// An entry was purged because its expiry time passed.
    Timeout,
    /// An insertion was rejected: no empty or tombstoned slot exists.
    Full,
}

impl EventKind {
    /// Lowercase name used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Inserted => "inserted",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
            EventKind::Timeout => "timeout",
            EventKind::Full => "full",
        }
    }
}

/// Receiver of table events.
///
/// `slot` is `None` only for [`EventKind::Full`], where no slot was touched.
///
/// Closures of the right shape are sinks:
///
/// ```
/// use mactable::event::{EventKind, EventSink};
/// use mactable::MacAddress;
///
/// let sink = |slot: Option<usize>, addr: &MacAddress, kind: EventKind| {
///     println!("{addr} {kind:?} at {slot:?}");
/// };
/// sink.on_event(Some(0), &MacAddress::BROADCAST, EventKind::Inserted);
/// ```
pub trait EventSink: Send {
    fn on_event(&self, slot: Option<usize>, address: &MacAddress, kind: EventKind);
}

impl<F> EventSink for F
where
    F: Fn(Option<usize>, &MacAddress, EventKind) + Send,
{
    fn on_event(&self, slot: Option<usize>, address: &MacAddress, kind: EventKind) {
        self(slot, address, kind)
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_event(&self, _slot: Option<usize>, _address: &MacAddress, _kind: EventKind) {}
}

/// Sink that writes one log line per event through the `log` facade.
///
/// Rejected insertions are logged at `warn`, everything else at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_event(&self, slot: Option<usize>, address: &MacAddress, kind: EventKind) {
        match (kind, slot) {
            (EventKind::Full, _) => warn!("mac table full, could not insert {address}"),
            (kind, Some(slot)) => info!("{address} {} at slot {slot}", kind.as_str()),
            (kind, None) => info!("{address} {}", kind.as_str()),
        }
    }
}

/// One event captured by an [`EventRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedEvent {
    pub slot: Option<usize>,
    pub address: MacAddress,
    pub kind: EventKind,
}

/// Sink that keeps every event in memory.
///
/// Clones share the same buffer: hand one clone to the table and read the
/// other.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out the events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns the events recorded so far.
    pub fn take(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of recorded events of `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventRecorder {
    fn on_event(&self, slot: Option<usize>, address: &MacAddress, kind: EventKind) {
        self.events.lock().push(RecordedEvent {
            slot,
            address: *address,
            kind,
        });
    }
}

/// Sink that forwards every event to two sinks in order.
#[derive(Debug, Clone, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn on_event(&self, slot: Option<usize>, address: &MacAddress, kind: EventKind) {
        self.0.on_event(slot, address, kind);
        self.1.on_event(slot, address, kind);
    }
}
