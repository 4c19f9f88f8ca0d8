//! Operation counters for a MAC table.
//!
//! The three `total_*` counters are cumulative and cleared by
//! [`TableStats::reset`]. `active_entries` is a gauge of occupied slots: it
//! always equals the number of live entries and is never reset.

use std::fmt;

/// Snapshot of table counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// New keys inserted (refreshes are not counted).
    pub total_inserts: u64,
    /// Entries removed by delete or an eviction policy.
    pub total_deletes: u64,
    /// Entries purged by the expiry timer.
    pub total_expired: u64,
    /// Currently occupied slots.
    pub active_entries: usize,
}

impl TableStats {
    #[inline]
    pub(crate) fn record_insert(&mut self) {
        self.total_inserts += 1;
        self.active_entries += 1;
    }

    #[inline]
    pub(crate) fn record_delete(&mut self) {
        self.total_deletes += 1;
        self.active_entries = self.active_entries.saturating_sub(1);
    }

    #[inline]
    pub(crate) fn record_expired(&mut self) {
        self.total_expired += 1;
        self.active_entries = self.active_entries.saturating_sub(1);
    }

    /// Clears the cumulative counters; `active_entries` is kept.
    pub(crate) fn reset(&mut self) {
        *self = TableStats {
            active_entries: self.active_entries,
            ..TableStats::default()
        };
    }
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserts={} deletes={} expired={} active={}",
            self.total_inserts, self.total_deletes, self.total_expired, self.active_entries
        )
    }
}
