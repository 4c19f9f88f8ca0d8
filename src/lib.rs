//! mactable: fixed-capacity MAC address learning table with TTL expiry.
//!
//! Entries are learned by insertion, refreshed on repeat sightings, and
//! forgotten by explicit deletion, by expiry, or by an eviction policy. The
//! table is open-addressed with tombstone deletion and never grows; an exact
//! min-heap of expiry times drives a single re-armable timer.
//!
//! ```
//! use std::time::Duration;
//! use mactable::prelude::*;
//!
//! let table = MacTableBuilder::new(1024)
//!     .default_ttl(Duration::from_secs(300))
//!     .event_sink(LogSink)
//!     .build();
//!
//! let host: MacAddress = "00:1a:2b:3c:4d:5e".parse().unwrap();
//! table.insert_with(host, InsertOptions::new().with_role(1));
//! assert!(table.exists(&host));
//!
//! // Make room, but never evict role-1 entries.
//! table.remove_oldest(&RoleSet::single(1));
//! assert!(table.exists(&host));
//! ```
//!
//! [`MacTableCore`] is the single-threaded engine; [`MacTable`] serializes it
//! behind a mutex and runs expiry on a background thread.

pub mod address;
pub mod builder;
#[cfg(feature = "concurrency")]
pub mod concurrent;
pub mod ds;
pub mod error;
pub mod event;
pub mod policy;
pub mod prelude;
pub mod scheduler;
pub mod stats;
pub mod table;
pub mod time;

pub use crate::address::MacAddress;
pub use crate::builder::MacTableBuilder;
#[cfg(feature = "concurrency")]
pub use crate::concurrent::MacTable;
pub use crate::ds::{Entry, SlotState};
pub use crate::error::{ConfigError, InvariantError, ParseAddressError};
pub use crate::event::{EventKind, EventSink};
pub use crate::policy::RoleSet;
pub use crate::stats::TableStats;
pub use crate::table::{DEFAULT_ROLE, InsertOptions, InsertOutcome, MacTableCore};
pub use crate::time::Timestamp;
