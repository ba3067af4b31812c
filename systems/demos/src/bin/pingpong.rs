use std::sync::{Arc, Mutex};

use baton::*;
use demos::pingpong::{Pinger, Ponger};

fn main() {
    let round_trip = Arc::new(Mutex::new(None));

    let mut sim = SimulationBuilder::default()
        .add_host("Jupiter", 25_000_000.0)
        .add_host("Tremblay", 98_095_000.0)
        .latency_topology(&[LatencyDescription::BetweenHosts(
            "Jupiter",
            "Tremblay",
            Distributions::Constant(Jiffies(50_000)),
        )])
        .link_bandwidth(BandwidthDescription::Bounded(1_000_000.0))
        .build();

    sim.spawn(
        "Jupiter",
        "pinger",
        Vec::new(),
        Pinger {
            peer: mailbox_alias("Tremblay", "ponger"),
            size: 1_000_000.0,
            round_trip: round_trip.clone(),
        },
    )
    .expect("Pinger should start");
    sim.spawn("Tremblay", "ponger", Vec::new(), Ponger { size: 1_000_000.0 })
        .expect("Ponger should start");

    sim.run();

    let elapsed = round_trip
        .lock()
        .expect("Lock is not poisoned")
        .expect("Pong should come back");
    println!("Round trip took {elapsed}s");
    // Two legs of 50ms latency plus 1s of transmission each.
    assert!((elapsed - 2.1).abs() < 1e-6);
}
