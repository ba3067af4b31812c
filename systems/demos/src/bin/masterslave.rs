use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use baton::*;
use demos::masterslave::{Master, Slave};

const SLAVE_HOSTS: [&str; 3] = ["Bourassa", "Fafard", "Ginette"];

fn main() {
    let executed = Arc::new(AtomicUsize::new(0));

    let mut sim = SimulationBuilder::default()
        .add_host("Tremblay", 98_095_000.0)
        .add_host("Bourassa", 98_095_000.0)
        .add_host("Fafard", 76_296_000.0)
        .add_host("Ginette", 48_492_000.0)
        .latency_topology(&[LatencyDescription::Default(Distributions::Uniform(
            Jiffies(1_000),
            Jiffies(5_000),
        ))])
        .link_bandwidth(BandwidthDescription::Bounded(1_250_000.0))
        .seed(42)
        .build();

    let slaves: Vec<String> = SLAVE_HOSTS
        .iter()
        .map(|host| mailbox_alias(host, "slave"))
        .collect();

    sim.spawn(
        "Tremblay",
        "master",
        Vec::new(),
        Master {
            tasks: 20,
            compute_cost: 50_000_000.0,
            size: 1_000_000.0,
            slaves,
        },
    )
    .expect("Master should start");

    for host in SLAVE_HOSTS {
        sim.spawn(
            host,
            "slave",
            Vec::new(),
            Slave {
                executed: executed.clone(),
            },
        )
        .expect("Slave should start");
    }

    sim.run();

    let done = executed.load(Ordering::Relaxed);
    println!("Executed {done} tasks in {}s", sim.now().as_secs());
    assert_eq!(done, 20);
}
