use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use baton::*;
use parking_lot::Mutex;

fn single_host() -> Simulation {
    SimulationBuilder::default()
        .add_host("Tremblay", 1e9)
        .build()
}

fn secs(s: f64) -> Jiffies {
    Jiffies::from_secs(s).expect("Valid duration")
}

#[test_log::test]
fn only_one_process_runs_at_a_time() {
    let inside = Arc::new(AtomicUsize::new(0));
    let violations = Arc::new(AtomicUsize::new(0));
    let steps = Arc::new(AtomicUsize::new(0));
    let mut sim = single_host();

    for i in 0..8 {
        let (inside, violations, steps) = (inside.clone(), violations.clone(), steps.clone());
        sim.spawn(
            "Tremblay",
            &format!("worker_{i}"),
            Vec::new(),
            move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                for _ in 0..50 {
                    if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                    std::thread::yield_now();
                    steps.fetch_add(1, Ordering::SeqCst);
                    inside.fetch_sub(1, Ordering::SeqCst);
                    ctx.sleep(0.001)?;
                }
                Ok(())
            },
        )
        .unwrap();
    }
    sim.run();

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert_eq!(steps.load(Ordering::SeqCst), 400);
}

#[test_log::test]
fn slave_sleeps_then_finishes() {
    let mut sim = single_host();
    let slave = sim
        .spawn(
            "Tremblay",
            "slave",
            Vec::new(),
            |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                log::info!("Hello!");
                ctx.sleep(10.0)?;
                log::info!("OK, goodbye now.");
                Ok(())
            },
        )
        .unwrap();

    assert_eq!(sim.state_of(slave), Ok(ExecState::New));
    sim.run();

    assert_eq!(sim.state_of(slave), Ok(ExecState::Done));
    assert_eq!(sim.now(), secs(10.0));
}

#[test_log::test]
fn pids_increase_and_reset_after_kill_all() {
    let children = Arc::new(Mutex::new(Vec::new()));
    let mut sim = single_host();

    let first = sim
        .spawn("Tremblay", "a", Vec::new(), |_: &mut Context, _: Vec<String>| -> SimResult<()> {
            Ok(())
        })
        .unwrap();
    let recorded = children.clone();
    let parent = sim
        .spawn(
            "Tremblay",
            "parent",
            Vec::new(),
            move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                let child = ctx.spawn(
                    &ctx.host(),
                    "child",
                    vec!["hello".to_string()],
                    |ctx: &mut Context, args: Vec<String>| -> SimResult<()> {
                        assert_eq!(args, vec!["hello".to_string()]);
                        ctx.sleep(100.0)
                    },
                )?;
                recorded.lock().push((child, ctx.pid()));
                Ok(())
            },
        )
        .unwrap();
    assert_eq!((first, parent), (1, 2));

    sim.run_until(secs(1.0));
    let (child, ppid) = children.lock()[0];
    assert_eq!(child, 3);
    assert_eq!(ppid, parent);
    assert_eq!(sim.state_of(child), Ok(ExecState::Blocked));

    assert_eq!(sim.kill_all(Some(5)), 5);
    assert_eq!(sim.state_of(child), Ok(ExecState::Done));
    let next = sim
        .spawn("Tremblay", "b", Vec::new(), |_: &mut Context, _: Vec<String>| -> SimResult<()> {
            Ok(())
        })
        .unwrap();
    assert_eq!(next, 5);
    sim.run();
}

#[test_log::test]
fn paused_process_sleeps_past_its_deadline() {
    let woke_at = Arc::new(Mutex::new(None));
    let mut sim = single_host();

    let recorded = woke_at.clone();
    let sleeper = sim
        .spawn(
            "Tremblay",
            "sleeper",
            Vec::new(),
            move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                ctx.sleep(10.0)?;
                *recorded.lock() = Some(ctx.now());
                Ok(())
            },
        )
        .unwrap();

    sim.run_until(secs(2.0));
    sim.pause(sleeper).unwrap();
    assert_eq!(sim.is_suspended(sleeper), Ok(true));

    sim.run_until(secs(20.0));
    assert_eq!(sim.now(), secs(20.0));
    assert_eq!(sim.state_of(sleeper), Ok(ExecState::Suspended));
    assert!(woke_at.lock().is_none());

    sim.resume(sleeper).unwrap();
    assert_eq!(sim.is_suspended(sleeper), Ok(false));
    sim.run();

    assert_eq!(*woke_at.lock(), Some(secs(20.0)));
    assert_eq!(sim.state_of(sleeper), Ok(ExecState::Done));
}

#[test_log::test]
fn process_can_pause_itself_until_resumed() {
    let mut sim = single_host();
    let lazy = sim
        .spawn(
            "Tremblay",
            "lazy",
            Vec::new(),
            |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                ctx.pause(ctx.pid())?;
                ctx.sleep(1.0)
            },
        )
        .unwrap();
    sim.spawn(
        "Tremblay",
        "waker",
        Vec::new(),
        move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
            ctx.sleep(3.0)?;
            assert_eq!(ctx.is_suspended(lazy), Ok(true));
            assert_eq!(ctx.state_of(lazy), Ok(ExecState::Suspended));
            ctx.resume(lazy)
        },
    )
    .unwrap();

    sim.run();
    assert_eq!(sim.now(), secs(4.0));
    assert_eq!(sim.state_of(lazy), Ok(ExecState::Done));
}

#[test_log::test]
fn killed_receiver_unwinds_with_process_killed() {
    let outcome = Arc::new(Mutex::new(None));
    let mut sim = single_host();

    let recorded = outcome.clone();
    let receiver = sim
        .spawn(
            "Tremblay",
            "receiver",
            Vec::new(),
            move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                let result = ctx.receive("nobody:writes", None, None);
                let killed = result.as_ref().err().cloned();
                *recorded.lock() = killed;
                // Blocking again after the kill must not hand the token back.
                let again = ctx.sleep(1.0);
                assert_eq!(again, Err(SimError::ProcessKilled));
                result.map(|_| ())
            },
        )
        .unwrap();

    sim.run_until(secs(5.0));
    assert_eq!(sim.state_of(receiver), Ok(ExecState::Blocked));
    sim.kill(receiver).unwrap();

    assert_eq!(*outcome.lock(), Some(SimError::ProcessKilled));
    assert_eq!(sim.state_of(receiver), Ok(ExecState::Done));
    assert_eq!(sim.now(), secs(5.0));
    sim.run();
}

#[test_log::test]
fn killing_a_new_process_skips_its_main() {
    let ran = Arc::new(AtomicUsize::new(0));
    let mut sim = single_host();

    let counter = ran.clone();
    let victim = sim
        .spawn(
            "Tremblay",
            "victim",
            Vec::new(),
            move |_: &mut Context, _: Vec<String>| -> SimResult<()> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .unwrap();
    sim.kill(victim).unwrap();
    sim.run();

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(sim.state_of(victim), Ok(ExecState::Done));
}

#[test_log::test]
fn killing_oneself_stops_main() {
    let reached = Arc::new(AtomicUsize::new(0));
    let mut sim = single_host();

    let counter = reached.clone();
    sim.spawn(
        "Tremblay",
        "suicidal",
        Vec::new(),
        move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
            ctx.kill(ctx.pid())?;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    )
    .unwrap();
    sim.run();

    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

#[test_log::test]
fn leftover_processes_are_killed_when_the_run_ends() {
    let outcome = Arc::new(Mutex::new(None));
    let mut sim = single_host();

    let recorded = outcome.clone();
    let stuck = sim
        .spawn(
            "Tremblay",
            "stuck",
            Vec::new(),
            move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                let result = ctx.receive("void", None, None);
                *recorded.lock() = result.as_ref().err().cloned();
                result.map(|_| ())
            },
        )
        .unwrap();
    sim.run();

    assert_eq!(*outcome.lock(), Some(SimError::ProcessKilled));
    assert_eq!(sim.state_of(stuck), Ok(ExecState::Done));
}

#[test_log::test]
fn time_budget_bounds_the_run() {
    let mut sim = SimulationBuilder::default()
        .add_host("Tremblay", 1e9)
        .time_budget(secs(5.0))
        .build();
    let sleeper = sim
        .spawn(
            "Tremblay",
            "sleeper",
            Vec::new(),
            |ctx: &mut Context, _: Vec<String>| -> SimResult<()> { ctx.sleep(10.0) },
        )
        .unwrap();
    sim.run();

    assert!(sim.now() <= secs(5.0));
    assert_eq!(sim.state_of(sleeper), Ok(ExecState::Done));
}

#[test_log::test]
fn spawn_rejects_bad_arguments() {
    let mut sim = single_host();
    let noop = |_: &mut Context, _: Vec<String>| -> SimResult<()> { Ok(()) };

    assert!(matches!(
        sim.spawn("Tremblay", "", Vec::new(), noop),
        Err(SimError::InvalidArgument(_))
    ));
    assert_eq!(
        sim.spawn("Nowhere", "lost", Vec::new(), noop),
        Err(SimError::HostNotFound("Nowhere".to_string()))
    );
    assert!(matches!(
        sim.pause(42),
        Err(SimError::NoSuchProcess(42))
    ));
}

#[test_log::test]
fn invalid_durations_are_reported_to_the_actor() {
    let outcome = Arc::new(Mutex::new(None));
    let mut sim = single_host();

    let recorded = outcome.clone();
    sim.spawn(
        "Tremblay",
        "confused",
        Vec::new(),
        move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
            *recorded.lock() = ctx.sleep(-1.0).err();
            Ok(())
        },
    )
    .unwrap();
    sim.run();

    assert!(matches!(
        *outcome.lock(),
        Some(SimError::InvalidArgument(_))
    ));
    assert_eq!(sim.now(), Jiffies(0));
}

#[test_log::test]
fn kill_all_from_an_actor_spares_the_caller() {
    let next = Arc::new(Mutex::new(None));
    let mut sim = single_host();

    let sleepy = |ctx: &mut Context, _: Vec<String>| -> SimResult<()> { ctx.sleep(50.0) };
    let a = sim.spawn("Tremblay", "a", Vec::new(), sleepy).unwrap();
    let b = sim.spawn("Tremblay", "b", Vec::new(), sleepy).unwrap();
    let recorded = next.clone();
    let killer = sim
        .spawn(
            "Tremblay",
            "killer",
            Vec::new(),
            move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                ctx.sleep(1.0)?;
                *recorded.lock() = Some(ctx.kill_all(None));
                ctx.sleep(1.0)
            },
        )
        .unwrap();
    sim.run();

    assert_eq!(*next.lock(), Some(killer + 1));
    assert_eq!(sim.now(), secs(2.0));
    for pid in [a, b, killer] {
        assert_eq!(sim.state_of(pid), Ok(ExecState::Done));
    }
}

type Started = Arc<Mutex<Vec<(ProcessId, Vec<String>, Option<ProcessId>)>>>;

fn recorder(
    started: Started,
) -> impl FnMut(&mut Context, Vec<String>) -> SimResult<()> + Send + 'static {
    move |ctx: &mut Context, args: Vec<String>| {
        assert_eq!(args, ctx.args());
        started.lock().push((ctx.pid(), args, ctx.ppid()));
        Ok(())
    }
}

#[test_log::test]
fn deployed_processes_start_in_declaration_order() {
    let started: Started = Arc::new(Mutex::new(Vec::new()));
    let mut sim = SimulationBuilder::default()
        .add_host("Tremblay", 1e9)
        .first_pid(10)
        .add_process("Tremblay", "first", vec!["1".to_string()], recorder(started.clone()))
        .add_process("Tremblay", "second", Vec::new(), recorder(started.clone()))
        .build();
    sim.run();

    assert_eq!(
        *started.lock(),
        vec![
            (10, vec!["1".to_string()], None),
            (11, Vec::new(), None),
        ]
    );
}

#[test_log::test]
fn killed_process_cannot_pause_itself() {
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let outcome = Arc::new(Mutex::new(None));

    let recorded = outcome.clone();
    let runner = std::thread::spawn(move || {
        let mut sim = single_host();
        let victim = sim
            .spawn(
                "Tremblay",
                "stubborn",
                Vec::new(),
                move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                    let me = ctx.pid();
                    let killed = ctx.kill(me);
                    let paused = ctx.pause(me);
                    *recorded.lock() = Some((killed, paused));
                    Ok(())
                },
            )
            .unwrap();
        sim.run();
        let _ = done_tx.send(sim.state_of(victim));
    });

    let state = done_rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .expect("Run should end instead of parking the killed process");
    runner.join().unwrap();

    assert_eq!(state, Ok(ExecState::Done));
    assert_eq!(
        *outcome.lock(),
        Some((Err(SimError::ProcessKilled), Err(SimError::ProcessKilled)))
    );
}

#[test_log::test]
fn kill_all_from_an_actor_hands_the_reset_pid_out_again() {
    let seen: Arc<Mutex<Vec<(&'static str, ProcessId)>>> = Arc::new(Mutex::new(Vec::new()));
    let mut sim = single_host();

    let sleepy = |ctx: &mut Context, _: Vec<String>| -> SimResult<()> { ctx.sleep(50.0) };
    let a = sim.spawn("Tremblay", "a", Vec::new(), sleepy).unwrap();
    let b = sim.spawn("Tremblay", "b", Vec::new(), sleepy).unwrap();
    let recorded = seen.clone();
    let killer = sim
        .spawn(
            "Tremblay",
            "killer",
            Vec::new(),
            move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                ctx.sleep(1.0)?;
                // Our own PID stays taken.
                let own = ctx.kill_all(Some(ctx.pid()));
                let next = ctx.kill_all(Some(1));
                let seen = recorded.clone();
                let child = ctx.spawn(
                    &ctx.host(),
                    "child",
                    Vec::new(),
                    move |ctx: &mut Context, _: Vec<String>| -> SimResult<()> {
                        ctx.sleep(5.0)?;
                        seen.lock().push(("child ran as", ctx.pid()));
                        Ok(())
                    },
                )?;
                recorded.lock().extend([("own", own), ("next", next), ("child", child)]);
                Ok(())
            },
        )
        .unwrap();
    assert_eq!((a, b, killer), (1, 2, 3));

    sim.run_until(secs(2.0));
    assert_eq!(sim.state_of(b), Ok(ExecState::Done));
    // PID 1 now names the child, still asleep although `a` has unwound.
    assert_eq!(sim.state_of(1), Ok(ExecState::Blocked));

    sim.run();
    assert_eq!(sim.state_of(1), Ok(ExecState::Done));
    assert_eq!(sim.now(), secs(6.0));
    assert_eq!(
        *seen.lock(),
        vec![("own", 4), ("next", 1), ("child", 1), ("child ran as", 1)]
    );
}
