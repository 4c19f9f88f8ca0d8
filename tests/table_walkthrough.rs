// ==============================================
// MAC TABLE WALKTHROUGHS (integration)
// ==============================================
//
// End-to-end scenarios against the public API, driven by a manual clock so
// every expiry is deterministic.

use std::time::Duration;

use mactable::builder::MacTableBuilder;
use mactable::event::{EventKind, EventRecorder, RecordedEvent};
use mactable::scheduler::{ManualTimer, SchedulerState};
use mactable::time::{ManualClock, Timestamp};
use mactable::{InsertOptions, InsertOutcome, MacAddress, MacTableCore, RoleSet, SlotState};

struct Harness {
    table: MacTableCore<ManualTimer>,
    clock: ManualClock,
    events: EventRecorder,
}

fn harness(capacity: usize, ttl_secs: u64) -> Harness {
    let clock = ManualClock::new();
    let events = EventRecorder::new();
    let table = MacTableBuilder::new(capacity)
        .default_ttl_secs(ttl_secs)
        .clock(clock.clone())
        .event_sink(events.clone())
        .try_build_core()
        .unwrap();
    Harness {
        table,
        clock,
        events,
    }
}

fn mac(text: &str) -> MacAddress {
    text.parse().unwrap()
}

// ==============================================
// Capacity-3 walkthrough
// ==============================================

#[test]
fn fill_reject_delete_reuse() {
    let mut h = harness(3, 300);
    let a = mac("00:00:00:00:00:0a");
    let b = mac("00:00:00:00:00:0b");
    let c = mac("00:00:00:00:00:0c");
    let d = mac("00:00:00:00:00:0d");

    let slot_a = h.table.insert(a);
    let slot_b = h.table.insert(b);
    let slot_c = h.table.insert(c);
    for outcome in [slot_a, slot_b, slot_c] {
        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
    }

    let before = h.table.entries();
    assert_eq!(h.table.insert(d), InsertOutcome::Full);
    assert_eq!(h.table.entries(), before);
    assert_eq!(
        h.events.events().last().copied(),
        Some(RecordedEvent {
            slot: None,
            address: d,
            kind: EventKind::Full
        })
    );

    let b_slot = slot_b.slot().unwrap();
    assert_eq!(h.table.delete(&b), Some(b_slot));
    assert_eq!(h.events.count(EventKind::Deleted), 1);

    assert_eq!(h.table.insert(d), InsertOutcome::Inserted(b_slot));
    assert!(h.table.exists(&a));
    assert!(!h.table.exists(&b));
    assert!(h.table.exists(&c));
    assert!(h.table.exists(&d));

    let stats = h.table.stats();
    assert_eq!(stats.total_inserts, 4);
    assert_eq!(stats.total_deletes, 1);
    assert_eq!(stats.active_entries, 3);
    h.table.check_invariants().unwrap();
}

#[test]
fn deleted_entry_is_gone_from_every_view() {
    let mut h = harness(3, 300);
    let a = mac("02:00:00:00:00:01");
    let slot = h.table.insert(a).slot().unwrap();
    h.table.delete(&a);
    assert_eq!(h.table.get_by_index(slot), None);
    assert_eq!(h.table.lookup(&a), None);
    assert!(h.table.entries().is_empty());
    assert_eq!(h.table.next_deadline(), None);

    let again = h.table.insert(a).slot().unwrap();
    assert_eq!(h.table.get_by_index(again).unwrap().state, SlotState::Occupied);
}

// ==============================================
// Refresh
// ==============================================

#[test]
fn refresh_moves_expiry_without_duplicating() {
    let mut h = harness(8, 300);
    let a = mac("00:1b:21:aa:bb:cc");

    let first = h
        .table
        .insert_with(a, InsertOptions::new().with_ttl(Duration::from_secs(10)));
    let second = h
        .table
        .insert_with(a, InsertOptions::new().with_ttl(Duration::from_secs(100)));

    assert_eq!(second, InsertOutcome::Updated(first.slot().unwrap()));
    assert_eq!(h.table.len(), 1);
    assert_eq!(h.table.next_deadline(), Some(Timestamp::from_secs(100)));

    // The old 10s deadline must not purge the refreshed entry.
    h.clock.advance(Duration::from_secs(11));
    assert_eq!(h.table.fire(), 0);
    assert!(h.table.exists(&a));
    h.table.check_invariants().unwrap();
}

// ==============================================
// Expiry
// ==============================================

#[test]
fn expiry_fires_once() {
    let mut h = harness(8, 300);
    let a = mac("00:1b:21:00:00:01");
    let slot = h
        .table
        .insert_with(a, InsertOptions::new().with_ttl(Duration::from_secs(1)))
        .slot()
        .unwrap();
    assert_eq!(
        h.table.scheduler_state(),
        SchedulerState::Armed(Timestamp::from_secs(1))
    );
    assert!(h.table.timer().is_due(Timestamp::from_secs(1)));

    h.clock.advance(Duration::from_millis(1500));
    assert_eq!(h.table.fire(), 1);
    assert_eq!(h.table.get_by_index(slot), None);
    assert_eq!(h.events.count(EventKind::Timeout), 1);
    assert_eq!(h.table.stats().total_expired, 1);
    assert_eq!(h.table.stats().active_entries, 0);
    assert_eq!(h.table.scheduler_state(), SchedulerState::Idle);

    assert_eq!(h.table.fire(), 0);
    assert_eq!(h.events.count(EventKind::Timeout), 1);
    h.table.check_invariants().unwrap();
}

#[test]
fn staggered_expiry_rearms_for_next_deadline() {
    let mut h = harness(8, 300);
    for (n, secs) in [(1u8, 3u64), (2, 1), (3, 2)] {
        h.table.insert_with(
            MacAddress::new(0, 0, 0, 0, 0, n),
            InsertOptions::new().with_ttl(Duration::from_secs(secs)),
        );
    }

    let mut order = Vec::new();
    for _ in 0..3 {
        let deadline = h.table.next_deadline().unwrap();
        h.clock.set(deadline);
        assert_eq!(h.table.fire(), 1);
        order.push(h.events.events().last().unwrap().address.as_bytes()[5]);
    }
    assert_eq!(order, vec![2, 3, 1]);
    assert!(h.table.is_empty());
}

#[test]
fn zero_ttl_entry_expires_on_next_fire() {
    let mut h = harness(4, 300);
    let a = mac("00:00:5e:00:53:01");
    h.table
        .insert_with(a, InsertOptions::new().with_ttl(Duration::ZERO));
    assert_eq!(h.table.next_deadline(), Some(h.table.now()));
    assert_eq!(h.table.fire(), 1);
    assert!(!h.table.exists(&a));
}

// ==============================================
// Protected eviction
// ==============================================

#[test]
fn remove_oldest_respects_protected_roles() {
    let mut h = harness(8, 300);
    let roles = [1u8, 0, 0];
    let addrs: Vec<MacAddress> = (0..3u8)
        .map(|n| MacAddress::new(0x02, 0, 0, 0, 0, n))
        .collect();
    for (addr, role) in addrs.iter().zip(roles) {
        h.table.insert_with(*addr, InsertOptions::new().with_role(role));
        h.clock.advance(Duration::from_secs(1));
    }

    let protected = RoleSet::single(1);
    assert!(h.table.remove_oldest(&protected));
    assert!(h.table.exists(&addrs[0]), "protected entry evicted");
    assert!(!h.table.exists(&addrs[1]));
    assert!(h.table.exists(&addrs[2]));

    assert!(h.table.remove_oldest(&protected));
    assert!(!h.table.exists(&addrs[2]));

    // Only role-1 entries remain.
    assert!(!h.table.remove_oldest(&protected));
    assert!(h.table.exists(&addrs[0]));
    h.table.check_invariants().unwrap();

    assert!(h.table.remove_oldest(&RoleSet::EMPTY));
    assert!(h.table.is_empty());
}

#[test]
fn evict_by_role_then_clear() {
    let mut h = harness(16, 300);
    for n in 0..10u8 {
        h.table.insert_with(
            MacAddress::new(0x02, 0, 0, 0, 0, n),
            InsertOptions::new().with_role(n % 3),
        );
    }
    assert_eq!(h.table.evict_by_role(0), 4);
    assert_eq!(h.table.len(), 6);
    assert_eq!(h.table.clear(), 6);
    assert_eq!(h.table.stats().total_deletes, 10);
    assert_eq!(h.events.count(EventKind::Deleted), 10);
    h.table.check_invariants().unwrap();
}

// ==============================================
// Stats
// ==============================================

#[test]
fn reset_stats_zeroes_totals_only() {
    let mut h = harness(4, 1);
    h.table.insert(mac("00:00:00:00:00:01"));
    h.table.insert(mac("00:00:00:00:00:02"));
    h.table.delete(&mac("00:00:00:00:00:02"));
    h.table.reset_stats();

    let stats = h.table.stats();
    assert_eq!(
        (stats.total_inserts, stats.total_deletes, stats.total_expired),
        (0, 0, 0)
    );
    assert_eq!(stats.active_entries, 1);

    h.clock.advance(Duration::from_secs(2));
    h.table.fire();
    assert_eq!(h.table.stats().total_expired, 1);
    assert_eq!(h.table.stats().active_entries, 0);
}
