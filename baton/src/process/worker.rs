//! Body of the thread backing one process.

use std::{
    panic::{self, AssertUnwindSafe},
    process,
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, error, info};

use crate::{
    Context, ProcessId, SimError,
    handoff::Baton,
    kernel::KernelBridge,
    process::{Actor, SlotId},
};

pub(crate) fn spawn_worker(
    kernel: Arc<dyn KernelBridge>,
    pid: ProcessId,
    slot: SlotId,
    name: &str,
    baton: Arc<Baton>,
    actor: Box<dyn Actor>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("P{pid}:{name}"))
        .spawn(move || run(kernel, pid, slot, baton, actor))
        .expect("Failed to spawn actor thread")
}

fn run(
    kernel: Arc<dyn KernelBridge>,
    pid: ProcessId,
    slot: SlotId,
    baton: Arc<Baton>,
    mut actor: Box<dyn Actor>,
) {
    baton.await_proceed();

    // Killed before it ever ran: skip user logic, still park once.
    if !kernel.is_killed(slot) {
        // Arguments are only complete once the first schedule happened.
        let args = kernel.args_of(slot);
        let mut ctx = Context::new(kernel.clone(), pid, slot, baton.clone());
        debug!("P{pid} entering main with {} argument(s)", args.len());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| actor.main(&mut ctx, args)));
        match outcome {
            Ok(Ok(())) => info!("P{pid} returned from main"),
            Ok(Err(SimError::ProcessKilled)) => info!("P{pid} unwound after kill"),
            Ok(Err(e)) if e.is_recoverable() && kernel.is_killed(slot) => {
                info!("P{pid} unwound after kill with {e}")
            }
            Ok(Err(e)) => fail_fast(pid, &e.to_string()),
            Err(_) => fail_fast(pid, "panic in main"),
        }
    }

    kernel.notify_done(slot);
    baton.park();
}

fn fail_fast(pid: ProcessId, reason: &str) -> ! {
    error!("P{pid} failed: {reason}. Unexpected behavior, stopping now");
    process::exit(1)
}
