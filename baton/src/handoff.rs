//! The execution token handoff between the kernel and one actor thread.
//!
//! Every process owns a `Baton`: two zero-capacity rendezvous channels,
//! "proceed" (kernel -> actor) and "parked" (actor -> kernel). Each
//! scheduling cycle carries exactly one signal in each direction:
//!
//! ```text
//!   kernel                         actor
//!   schedule() ── proceed ──────▶  (returns from await_proceed)
//!        │                          runs user code ...
//!   (blocked) ◀────── parked ───── unschedule() / final park()
//! ```
//!
//! Only the kernel loop calls `schedule`, and only the owning actor thread
//! calls the actor-side methods.

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, error};

pub(crate) struct Baton {
    proceed_tx: Sender<()>,
    proceed_rx: Receiver<()>,
    parked_tx: Sender<()>,
    parked_rx: Receiver<()>,
}

impl Baton {
    pub(crate) fn new() -> Self {
        let (proceed_tx, proceed_rx) = bounded(0);
        let (parked_tx, parked_rx) = bounded(0);
        Self {
            proceed_tx,
            proceed_rx,
            parked_tx,
            parked_rx,
        }
    }

    /// Kernel side: hand the token over and wait until it comes back.
    pub(crate) fn schedule(&self) {
        if self.proceed_tx.send(()).is_err() {
            error!("Proceed signal lost, actor thread is gone");
            return;
        }
        if self.parked_rx.recv().is_err() {
            error!("Parked signal lost, actor thread is gone");
        }
    }

    /// Actor side: give the token back, then sleep until scheduled again.
    /// This is the only suspension point inside actor code.
    pub(crate) fn unschedule(&self) {
        self.park();
        self.await_proceed();
    }

    /// Actor side: first wait of a fresh thread.
    pub(crate) fn await_proceed(&self) {
        if self.proceed_rx.recv().is_err() {
            error!("Proceed channel closed while waiting");
        }
        debug!("Token acquired");
    }

    /// Actor side: release the kernel. Called alone exactly once, on exit.
    pub(crate) fn park(&self) {
        debug!("Token released");
        if self.parked_tx.send(()).is_err() {
            error!("Parked channel closed while releasing");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
    };

    use super::*;

    #[test]
    fn schedule_returns_only_after_actor_parks() {
        let baton = Arc::new(Baton::new());
        let journal = Arc::new(Mutex::new(Vec::new()));

        let actor = {
            let baton = baton.clone();
            let journal = journal.clone();
            thread::spawn(move || {
                baton.await_proceed();
                journal.lock().unwrap().push("actor: first slice");
                baton.unschedule();
                journal.lock().unwrap().push("actor: second slice");
                baton.park();
            })
        };

        journal.lock().unwrap().push("kernel: before first schedule");
        baton.schedule();
        journal.lock().unwrap().push("kernel: between slices");
        baton.schedule();
        journal.lock().unwrap().push("kernel: after actor exit");
        actor.join().unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec![
                "kernel: before first schedule",
                "actor: first slice",
                "kernel: between slices",
                "actor: second slice",
                "kernel: after actor exit",
            ]
        );
    }

    #[test]
    fn fresh_actor_does_not_run_before_schedule() {
        let baton = Arc::new(Baton::new());
        let started = Arc::new(Mutex::new(false));

        let actor = {
            let baton = baton.clone();
            let started = started.clone();
            thread::spawn(move || {
                baton.await_proceed();
                *started.lock().unwrap() = true;
                baton.park();
            })
        };

        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!*started.lock().unwrap());
        baton.schedule();
        assert!(*started.lock().unwrap());
        actor.join().unwrap();
    }
}
