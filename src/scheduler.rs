//! Expiry scheduler: one re-armable timer tracking the queue minimum.
//!
//! The table never polls. After every mutation it tells the scheduler what
//! the expiry queue's minimum now is, and the scheduler keeps a single
//! "fire once at T" timer pointed at that minimum.
//!
//! ## State Machine
//!
//! ```text
//!                  sync(Some(t)): arm(t)
//!   ┌─────────┐ ─────────────────────────► ┌────────────┐
//!   │  Idle   │                            │  Armed(t)  │ ──┐ sync(Some(t')), t' != t
//!   └─────────┘ ◄───────────────────────── └────────────┘ ◄─┘ arm(t')
//!                  sync(None): disarm()
//!                  fired()
//! ```
//!
//! `sync` is idempotent: syncing the deadline that is already armed does not
//! touch the timer. A deadline at or before "now" is armed like any other;
//! the timer fires it at the next opportunity.
//!
//! ## Timers
//!
//! | Timer          | Fires by                                        |
//! |----------------|-------------------------------------------------|
//! | `CondvarTimer` | waking the `MacTable` worker thread             |
//! | `ManualTimer`  | whoever reads [`ManualTimer::armed`] and calls `fire` |

use std::sync::Arc;

use log::{debug, trace};
use parking_lot::{Condvar, Mutex};

use crate::time::Timestamp;

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// No timer pending; the expiry queue is empty or was just drained.
    #[default]
    Idle,
    /// Timer pending for this deadline.
    Armed(Timestamp),
}

impl SchedulerState {
    pub fn deadline(&self) -> Option<Timestamp> {
        match self {
            SchedulerState::Idle => None,
            SchedulerState::Armed(at) => Some(*at),
        }
    }
}

/// A "fire once at T" primitive supplied by the host runtime.
///
/// Calls are always made with the table locked, so they are serialized with
/// table mutation. Arming replaces any previously armed deadline.
pub trait Timer: Send {
    fn arm(&mut self, deadline: Timestamp);
    fn disarm(&mut self);
}

impl Timer for Box<dyn Timer> {
    fn arm(&mut self, deadline: Timestamp) {
        (**self).arm(deadline)
    }

    fn disarm(&mut self) {
        (**self).disarm()
    }
}

/// Keeps a [`Timer`] aimed at the expiry queue minimum.
#[derive(Debug)]
pub struct ExpiryScheduler<T> {
    timer: T,
    state: SchedulerState,
}

impl<T: Timer> ExpiryScheduler<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            state: SchedulerState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Aligns the timer with the queue minimum `min`.
    ///
    /// Returns `true` if the timer was armed, re-armed or disarmed.
    pub fn sync(&mut self, min: Option<Timestamp>) -> bool {
        match (self.state, min) {
            (SchedulerState::Idle, None) => false,
            (SchedulerState::Armed(_), None) => {
                self.timer.disarm();
                self.state = SchedulerState::Idle;
                debug!("expiry scheduler idle");
                true
            },
            (SchedulerState::Armed(current), Some(next)) if current == next => {
                trace!("expiry timer already armed for {next}");
                false
            },
            (_, Some(next)) => {
                self.timer.arm(next);
                self.state = SchedulerState::Armed(next);
                debug!("expiry timer armed for {next}");
                true
            },
        }
    }

    /// Consumes the pending timer once its deadline was reached. The caller
    /// drains the queue and then calls [`sync`](Self::sync) again.
    pub fn fired(&mut self) {
        if let SchedulerState::Armed(at) = self.state {
            self.timer.disarm();
            self.state = SchedulerState::Idle;
            trace!("expiry timer for {at} fired");
        }
    }
}

// ---------------------------------------------------------------------------
// CondvarTimer
// ---------------------------------------------------------------------------

/// Timer that wakes a thread parked on a [`Condvar`].
///
/// The sleeping thread re-reads the armed deadline from the scheduler state
/// after every wake-up; the timer itself carries no deadline.
#[derive(Debug, Clone)]
pub struct CondvarTimer {
    wake: Arc<Condvar>,
}

impl CondvarTimer {
    pub fn new(wake: Arc<Condvar>) -> Self {
        Self { wake }
    }
}

impl Timer for CondvarTimer {
    fn arm(&mut self, _deadline: Timestamp) {
        self.wake.notify_all();
    }

    fn disarm(&mut self) {
        self.wake.notify_all();
    }
}

// ---------------------------------------------------------------------------
// ManualTimer
// ---------------------------------------------------------------------------

/// Timer that only records what it was asked to do.
///
/// Clones share state, so a host runtime or test keeps one handle to learn
/// when the table wants to be fired.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualTimerState>>,
}

#[derive(Debug, Default)]
struct ManualTimerState {
    armed: Option<Timestamp>,
    arm_count: u64,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently armed deadline.
    pub fn armed(&self) -> Option<Timestamp> {
        self.inner.lock().armed
    }

    /// Number of `arm` calls so far.
    pub fn arm_count(&self) -> u64 {
        self.inner.lock().arm_count
    }

    /// Whether the armed deadline is at or before `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.armed().is_some_and(|at| at <= now)
    }
}

impl Timer for ManualTimer {
    fn arm(&mut self, deadline: Timestamp) {
        let mut state = self.inner.lock();
        state.armed = Some(deadline);
        state.arm_count += 1;
    }

    fn disarm(&mut self) {
        self.inner.lock().armed = None;
    }
}
