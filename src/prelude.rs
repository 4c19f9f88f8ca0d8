pub use crate::address::MacAddress;
pub use crate::builder::MacTableBuilder;
#[cfg(feature = "concurrency")]
pub use crate::concurrent::MacTable;
pub use crate::ds::{Entry, SlotState};
pub use crate::error::{ConfigError, InvariantError, ParseAddressError};
pub use crate::event::{EventKind, EventRecorder, EventSink, LogSink, NoopSink};
pub use crate::policy::RoleSet;
pub use crate::scheduler::{ManualTimer, SchedulerState, Timer};
pub use crate::stats::TableStats;
pub use crate::table::{InsertOptions, InsertOutcome, MacTableCore};
pub use crate::time::{Clock, ManualClock, MonotonicClock, Timestamp};
