//! Walks a five-slot table through learning, rejection, refresh, deletion,
//! role-protected eviction and expiry.
//!
//! Run with `RUST_LOG=info cargo run --example basic_table`.

use std::thread;
use std::time::Duration;

use log::info;
use mactable::event::LogSink;
use mactable::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let table = MacTableBuilder::new(5)
        .default_ttl(Duration::from_secs(2))
        .event_sink(LogSink)
        .try_build()?;

    let hosts: Vec<MacAddress> = [
        "00:1a:2b:3c:4d:5e",
        "00:1a:2b:3c:4d:5f",
        "00:1a:2b:3c:4d:60",
        "00:1a:2b:3c:4d:61",
        "00:1a:2b:3c:4d:62",
        "00:1a:2b:3c:4d:63",
    ]
    .iter()
    .map(|text| text.parse::<MacAddress>())
    .collect::<Result<_, _>>()?;

    info!("inserting {} hosts into {} slots", hosts.len(), table.capacity());
    for host in &hosts {
        table.insert(*host);
    }
    info!("stats: {}", table.stats());

    info!("{} known: {}", hosts[0], table.exists(&hosts[0]));
    info!("{} known: {}", hosts[5], table.exists(&hosts[5]));
    if let Some(entry) = table.get_by_index(0) {
        info!("slot 0 holds {} (expires {})", entry.address, entry.expires_at);
    }

    info!("refreshing {} as a protected uplink", hosts[0]);
    table.insert_with(
        hosts[0],
        InsertOptions::new()
            .with_ttl(Duration::from_secs(4))
            .with_role(1),
    );

    table.delete(&hosts[2]);
    info!("{} known after delete: {}", hosts[2], table.exists(&hosts[2]));
    table.insert(hosts[2]);

    let uplinks = RoleSet::single(1);
    if table.remove_oldest(&uplinks) {
        info!("evicted the oldest non-uplink entry");
    }

    info!("waiting for expiry");
    while !table.is_empty() {
        thread::sleep(Duration::from_millis(250));
    }
    info!("stats: {}", table.stats());
    table.check_invariants()?;
    Ok(())
}
