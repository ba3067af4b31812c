use std::sync::{Arc, Mutex};

use baton::*;
use demos::suspend::DreamMaster;

fn main() {
    let observed = Arc::new(Mutex::new(Vec::new()));

    let mut sim = SimulationBuilder::default()
        .add_host("Jacquelin", 137_333_000.0)
        .add_process(
            "Jacquelin",
            "dream_master",
            Vec::new(),
            DreamMaster {
                observed: observed.clone(),
            },
        )
        .build();

    sim.run();

    let observed = observed.lock().expect("Lock is not poisoned");
    for (at, state) in observed.iter() {
        println!("At {at}s the lazy guy was {state}");
    }
    assert_eq!(
        *observed,
        vec![
            (10.0, ExecState::Suspended),
            (15.0, ExecState::Blocked),
            (35.0, ExecState::Suspended),
        ]
    );
    // Woken at 35s, the nap it was paused in already ended at 20s.
    assert_eq!(sim.now().as_secs(), 35.0);
}
