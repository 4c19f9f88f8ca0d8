use std::time::Duration;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use mactable::builder::MacTableBuilder;
use mactable::time::ManualClock;
use mactable::{MacAddress, RoleSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CAPACITY: usize = 1024;

fn random_addresses(count: usize, seed: u64) -> Vec<MacAddress> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| MacAddress(rng.r#gen())).collect()
}

fn bench_insert_lookup(c: &mut Criterion) {
    let addrs = random_addresses(CAPACITY * 3 / 4, 7);
    c.bench_function("mactable_insert_lookup", |b| {
        b.iter(|| {
            let mut table = MacTableBuilder::new(CAPACITY)
                .clock(ManualClock::new())
                .try_build_core()
                .unwrap();
            for addr in &addrs {
                table.insert(*addr);
            }
            for addr in &addrs {
                let _ = table.exists(addr);
            }
        })
    });
}

fn bench_refresh(c: &mut Criterion) {
    let addrs = random_addresses(CAPACITY / 2, 11);
    let clock = ManualClock::new();
    let mut table = MacTableBuilder::new(CAPACITY)
        .clock(clock.clone())
        .try_build_core()
        .unwrap();
    for addr in &addrs {
        table.insert(*addr);
    }
    c.bench_function("mactable_refresh", |b| {
        b.iter(|| {
            clock.advance(Duration::from_millis(1));
            for addr in &addrs {
                table.insert(*addr);
            }
        })
    });
}

fn bench_churn_with_tombstones(c: &mut Criterion) {
    let addrs = random_addresses(CAPACITY * 4, 13);
    c.bench_function("mactable_churn", |b| {
        b.iter(|| {
            let mut table = MacTableBuilder::new(CAPACITY)
                .clock(ManualClock::new())
                .try_build_core()
                .unwrap();
            for (i, addr) in addrs.iter().enumerate() {
                if table.insert(*addr).is_full() {
                    table.remove_oldest(&RoleSet::EMPTY);
                }
                if i % 3 == 0 {
                    table.delete(addr);
                }
            }
        })
    });
}

fn bench_expiry_drain(c: &mut Criterion) {
    let addrs = random_addresses(CAPACITY, 17);
    c.bench_function("mactable_expiry_drain", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new();
                let mut table = MacTableBuilder::new(CAPACITY)
                    .default_ttl_secs(1)
                    .clock(clock.clone())
                    .try_build_core()
                    .unwrap();
                for addr in &addrs {
                    table.insert(*addr);
                }
                clock.advance(Duration::from_secs(2));
                table
            },
            |mut table| table.fire(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_insert_lookup,
    bench_refresh,
    bench_churn_with_tombstones,
    bench_expiry_drain
);
criterion_main!(benches);
