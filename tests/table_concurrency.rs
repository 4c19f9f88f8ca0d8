// ==============================================
// MAC TABLE CONCURRENCY TESTS (integration)
// ==============================================
//
// The shared table serializes application calls and expiry purges behind
// one lock. These tests hammer it from several threads, with and without a
// live expiry worker, and check the table stays internally consistent.

#![cfg(feature = "concurrency")]

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use mactable::builder::MacTableBuilder;
use mactable::event::{EventKind, EventRecorder};
use mactable::scheduler::SchedulerState;
use mactable::time::ManualClock;
use mactable::{InsertOptions, InsertOutcome, MacAddress, MacTable, RoleSet};

fn mac(thread: u8, n: u8) -> MacAddress {
    MacAddress::new(0x02, 0x00, 0x00, 0x00, thread, n)
}

/// Polls `cond` until it holds or `timeout` passes.
fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

// ==============================================
// Expiry worker
// ==============================================

mod expiry_worker {
    use super::*;

    #[test]
    fn worker_purges_expired_entries() {
        let events = EventRecorder::new();
        let table = MacTableBuilder::new(16)
            .default_ttl(Duration::from_millis(50))
            .event_sink(events.clone())
            .build();
        assert!(table.has_worker());

        let addr = mac(0, 1);
        table.insert(addr);
        assert!(
            wait_until(Duration::from_secs(5), || !table.exists(&addr)),
            "entry was not purged by the worker"
        );
        assert_eq!(events.count(EventKind::Timeout), 1);
        assert_eq!(table.stats().total_expired, 1);
        assert_eq!(table.scheduler_state(), SchedulerState::Idle);
        table.check_invariants().unwrap();
    }

    #[test]
    fn earlier_deadline_shortens_worker_sleep() {
        let table = MacTableBuilder::new(16)
            .default_ttl(Duration::from_secs(3600))
            .build();

        let long_lived = mac(0, 1);
        let short_lived = mac(0, 2);
        table.insert(long_lived);
        table.insert_with(
            short_lived,
            InsertOptions::new().with_ttl(Duration::from_millis(30)),
        );

        assert!(wait_until(Duration::from_secs(5), || !table.exists(&short_lived)));
        assert!(table.exists(&long_lived));
        table.check_invariants().unwrap();
    }

    #[test]
    fn refresh_postpones_worker_expiry() {
        let table = MacTableBuilder::new(16)
            .default_ttl(Duration::from_millis(100))
            .build();
        let addr = mac(0, 7);
        table.insert(addr);
        table.insert_with(addr, InsertOptions::new().with_ttl(Duration::from_secs(3600)));

        thread::sleep(Duration::from_millis(250));
        assert!(table.exists(&addr));
        table.check_invariants().unwrap();
    }

    #[test]
    fn shutdown_stops_expiry() {
        let mut table = MacTableBuilder::new(4)
            .default_ttl(Duration::from_millis(20))
            .build();
        table.shutdown();
        let addr = mac(0, 3);
        table.insert(addr);
        thread::sleep(Duration::from_millis(100));
        assert!(table.exists(&addr));
        assert_eq!(table.fire(), 1);
        assert!(!table.exists(&addr));
    }

    #[test]
    fn drop_joins_idle_worker() {
        let table = MacTable::new(4, Duration::from_secs(60), mactable::event::NoopSink).unwrap();
        drop(table);
    }
}

// ==============================================
// Concurrent mutation
// ==============================================

mod concurrent_mutation {
    use super::*;

    #[test]
    fn disjoint_inserts_from_many_threads() {
        let threads = 8u8;
        let per_thread = 32u8;
        let table = Arc::new(
            MacTableBuilder::new(threads as usize * per_thread as usize)
                .default_ttl(Duration::from_secs(3600))
                .build(),
        );
        let barrier = Arc::new(Barrier::new(threads as usize));

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let table = Arc::clone(&table);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for n in 0..per_thread {
                        let outcome = table.insert(mac(t, n));
                        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.len(), threads as usize * per_thread as usize);
        assert_eq!(table.stats().total_inserts, u64::from(threads) * u64::from(per_thread));
        table.check_invariants().unwrap();
    }

    #[test]
    fn same_key_from_many_threads_is_stored_once() {
        let threads = 8;
        let table = Arc::new(MacTableBuilder::new(8).build());
        let barrier = Arc::new(Barrier::new(threads));
        let addr = mac(9, 9);

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let table = Arc::clone(&table);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..100 {
                        table.insert(addr);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.len(), 1);
        assert_eq!(table.stats().total_inserts, 1);
        table.check_invariants().unwrap();
    }

    #[test]
    fn mixed_operations_keep_invariants() {
        let threads = 6u8;
        let table = Arc::new(
            MacTableBuilder::new(24)
                .default_ttl(Duration::from_millis(5))
                .build(),
        );
        let barrier = Arc::new(Barrier::new(threads as usize));

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let table = Arc::clone(&table);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..300u16 {
                        let n = (i % 16) as u8;
                        match (i + u16::from(t)) % 6 {
                            0 | 1 => {
                                table.insert_with(
                                    mac(t % 2, n),
                                    InsertOptions::new().with_role(t % 3),
                                );
                            },
                            2 => {
                                table.delete(&mac(t % 2, n));
                            },
                            3 => {
                                table.remove_oldest(&RoleSet::single(2));
                            },
                            4 => {
                                table.evict_by_role(t % 3);
                            },
                            _ => {
                                table.check_invariants().unwrap();
                            },
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        table.check_invariants().unwrap();
        let stats = table.stats();
        assert_eq!(stats.active_entries, table.entries().len());
        assert_eq!(
            stats.total_inserts,
            stats.total_deletes + stats.total_expired + stats.active_entries as u64
        );
    }

    #[test]
    fn manual_fire_races_with_inserts() {
        let clock = ManualClock::new();
        let table = Arc::new(
            MacTableBuilder::new(64)
                .default_ttl(Duration::from_secs(1))
                .clock(clock.clone())
                .spawn_worker(false)
                .build(),
        );
        let barrier = Arc::new(Barrier::new(3));

        let inserter = {
            let table = Arc::clone(&table);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for n in 0..64u8 {
                    table.insert(mac(1, n));
                }
            })
        };
        let ticker = {
            let clock = clock.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..64 {
                    clock.advance(Duration::from_millis(100));
                    thread::yield_now();
                }
            })
        };
        let firer = {
            let table = Arc::clone(&table);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..64 {
                    table.fire();
                    thread::yield_now();
                }
            })
        };
        inserter.join().unwrap();
        ticker.join().unwrap();
        firer.join().unwrap();

        table.check_invariants().unwrap();
        clock.advance(Duration::from_secs(2));
        table.fire();
        assert!(table.is_empty());
        assert_eq!(table.stats().total_expired, 64);
    }
}
