//! Table configuration.
//!
//! [`MacTableBuilder`] collects the construction parameters and produces
//! either the thread-safe [`MacTable`](crate::concurrent::MacTable) or a bare
//! single-threaded [`MacTableCore`].
//!
//! | Setting         | Default            |
//! |-----------------|--------------------|
//! | `capacity`      | required, > 0      |
//! | `default_ttl`   | 300 s              |
//! | `event_sink`    | [`NoopSink`]       |
//! | `clock`         | [`MonotonicClock`] |
//! | `spawn_worker`  | `true`             |
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use mactable::builder::MacTableBuilder;
//! use mactable::event::LogSink;
//!
//! let table = MacTableBuilder::new(256)
//!     .default_ttl(Duration::from_secs(60))
//!     .event_sink(LogSink)
//!     .build();
//! assert_eq!(table.capacity(), 256);
//! ```
//!
//! Construction is all-or-nothing: when `try_build` fails, no slot storage,
//! queue or worker thread is left behind.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "concurrency")]
use parking_lot::Condvar;

#[cfg(feature = "concurrency")]
use crate::concurrent::MacTable;
use crate::error::ConfigError;
use crate::event::{EventSink, NoopSink};
#[cfg(feature = "concurrency")]
use crate::scheduler::CondvarTimer;
use crate::scheduler::{ManualTimer, Timer};
use crate::table::MacTableCore;
use crate::time::{Clock, MonotonicClock};

/// Default entry lifetime, the customary bridge ageing time.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Builder for MAC tables.
pub struct MacTableBuilder {
    capacity: usize,
    default_ttl: Duration,
    sink: Option<Box<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
    spawn_worker: bool,
    timer: Option<Box<dyn Timer>>,
}

impl MacTableBuilder {
    /// Creates a builder for a table of `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            default_ttl: DEFAULT_TTL,
            sink: None,
            clock: None,
            spawn_worker: true,
            timer: None,
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Lifetime of entries inserted without a TTL override.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl_secs(self, secs: u64) -> Self {
        self.default_ttl(Duration::from_secs(secs))
    }

    /// Receiver of table events.
    pub fn event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Time source for expiry.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Whether [`try_build`](Self::try_build) starts the background expiry
    /// thread.
    pub fn spawn_worker(mut self, spawn: bool) -> Self {
        self.spawn_worker = spawn;
        self
    }

    /// Drives expiry from a host-supplied timer instead of the worker
    /// thread. The host calls `fire` when the timer goes off.
    pub fn external_timer(mut self, timer: impl Timer + 'static) -> Self {
        self.timer = Some(Box::new(timer));
        self.spawn_worker = false;
        self
    }

    /// Builds a single-threaded table armed through a [`ManualTimer`].
    pub fn try_build_core(self) -> Result<MacTableCore<ManualTimer>, ConfigError> {
        self.try_build_core_with(ManualTimer::new())
    }

    /// Builds a single-threaded table armed through `timer`.
    pub fn try_build_core_with<T: Timer>(self, timer: T) -> Result<MacTableCore<T>, ConfigError> {
        let sink = self.sink.unwrap_or_else(|| Box::new(NoopSink));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        MacTableCore::try_new(self.capacity, self.default_ttl, sink, clock, timer)
    }

    /// Builds the thread-safe table.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid or the worker thread cannot be
    /// started. For a non-panicking alternative, use
    /// [`try_build`](Self::try_build).
    #[cfg(feature = "concurrency")]
    pub fn build(self) -> MacTable {
        match self.try_build() {
            Ok(table) => table,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the thread-safe table, returning an error on invalid
    /// parameters instead of panicking.
    ///
    /// # Example
    ///
    /// ```
    /// use mactable::builder::MacTableBuilder;
    ///
    /// assert!(MacTableBuilder::new(0).try_build().is_err());
    /// assert!(MacTableBuilder::new(8).try_build().is_ok());
    /// ```
    #[cfg(feature = "concurrency")]
    pub fn try_build(mut self) -> Result<MacTable, ConfigError> {
        let spawn_worker = self.spawn_worker;
        let external = self.timer.take();
        if spawn_worker && external.is_some() {
            return Err(ConfigError::new(
                "an external timer cannot be combined with the expiry worker",
            ));
        }

        let wake = Arc::new(Condvar::new());
        let timer: Box<dyn Timer> = match external {
            Some(timer) => timer,
            None if spawn_worker => Box::new(CondvarTimer::new(Arc::clone(&wake))),
            None => Box::new(ManualTimer::new()),
        };
        let core = self.try_build_core_with(timer)?;
        MacTable::from_core(core, wake, spawn_worker)
    }
}

impl fmt::Debug for MacTableBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacTableBuilder")
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("sink", &self.sink.is_some())
            .field("clock", &self.clock)
            .field("spawn_worker", &self.spawn_worker)
            .field("external_timer", &self.timer.is_some())
            .finish()
    }
}
