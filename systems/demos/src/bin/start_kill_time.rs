use baton::*;
use demos::start_kill_time::Reaper;

fn main() {
    let mut sim = SimulationBuilder::default()
        .add_host("Fafard", 76_296_000.0)
        .build();

    let reaper = sim
        .spawn(
            "Fafard",
            "reaper",
            Vec::new(),
            Reaper {
                sleepers: 4,
                deadline: 12.0,
            },
        )
        .expect("Reaper should start");

    sim.run();

    println!("Simulation ended at {}s", sim.now().as_secs());
    // Naps of 5s and 10s started at 0s and 1s end on their own; the rest die at 12s.
    assert_eq!(sim.now().as_secs(), 12.0);
    assert_eq!(sim.state_of(reaper), Ok(ExecState::Done));
    for pid in reaper + 1..=reaper + 4 {
        assert_eq!(sim.state_of(pid), Ok(ExecState::Done));
    }
}
