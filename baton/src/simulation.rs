use std::sync::Arc;

use log::{debug, info, warn};

use crate::{
    Actor, ExecState, ProcessId, SimResult,
    kernel::{Kernel, KernelBridge},
    progress::Bar,
    time::Jiffies,
};

/// A configured simulation: the kernel plus the loop that drives it.
///
/// The loop hands the execution token to every ready process in turn, and
/// only when none is left advances simulated time to the next event. The
/// kernel-side operations below are meant to be called between runs, while
/// no process holds the token.
pub struct Simulation {
    kernel: Arc<Kernel>,
    time_budget: Jiffies,
    progress_bar: Bar,
    finished: bool,
}

impl Simulation {
    pub(crate) fn new(kernel: Arc<Kernel>, time_budget: Jiffies) -> Self {
        Self {
            kernel,
            time_budget,
            progress_bar: Bar::new(time_budget),
            finished: false,
        }
    }

    /// Runs until nothing is left to do or the time budget is exhausted,
    /// then kills the leftovers and joins every process thread.
    pub fn run(&mut self) {
        self.run_events(self.time_budget);
        self.finish();
    }

    /// Runs every event due no later than `horizon` (capped by the budget)
    /// and leaves the clock at `horizon`.
    pub fn run_until(&mut self, horizon: Jiffies) {
        let horizon = horizon.min(self.time_budget);
        self.run_events(horizon);
        if horizon != Jiffies::MAX {
            self.kernel.advance_to(horizon);
        }
    }

    pub fn spawn(
        &mut self,
        host: &str,
        name: &str,
        args: Vec<String>,
        actor: impl Actor,
    ) -> SimResult<ProcessId> {
        let pid = self
            .kernel
            .register_process(None, host, name, args, Box::new(actor))?;
        self.finished = false;
        Ok(pid)
    }

    pub fn now(&self) -> Jiffies {
        self.kernel.now()
    }

    pub fn state_of(&self, pid: ProcessId) -> SimResult<ExecState> {
        self.kernel.state_of(self.kernel.lookup(pid)?)
    }

    pub fn host_of(&self, pid: ProcessId) -> SimResult<String> {
        self.kernel.host_of(self.kernel.lookup(pid)?)
    }

    pub fn is_suspended(&self, pid: ProcessId) -> SimResult<bool> {
        self.kernel.is_suspended(self.kernel.lookup(pid)?)
    }

    pub fn pause(&mut self, pid: ProcessId) -> SimResult<()> {
        self.kernel.suspend(self.kernel.lookup(pid)?)
    }

    pub fn resume(&mut self, pid: ProcessId) -> SimResult<()> {
        self.kernel.resume(self.kernel.lookup(pid)?)
    }

    /// The victim unwinds right away, at the current simulated time.
    pub fn kill(&mut self, pid: ProcessId) -> SimResult<()> {
        self.kernel.kill(self.kernel.lookup(pid)?)?;
        self.drain_ready();
        Ok(())
    }

    /// Kills every process. With `reset_pid`, processes created afterwards
    /// are numbered from there. Returns the next PID.
    pub fn kill_all(&mut self, reset_pid: Option<ProcessId>) -> ProcessId {
        let next = self.kernel.kill_all(None, reset_pid);
        self.drain_ready();
        next
    }

    pub fn migrate(&mut self, pid: ProcessId, host: &str) -> SimResult<()> {
        self.kernel.migrate(self.kernel.lookup(pid)?, host)
    }

    pub fn fail_host(&mut self, host: &str) -> SimResult<()> {
        self.kernel.fail_host(host)?;
        self.drain_ready();
        Ok(())
    }
}

impl Simulation {
    fn run_events(&mut self, horizon: Jiffies) {
        loop {
            self.drain_ready();
            match self.kernel.fire_next(horizon) {
                Some(now) => self.progress_bar.make_progress(now),
                None => break,
            }
        }
    }

    fn drain_ready(&mut self) {
        while let Some((pid, baton)) = self.kernel.next_runnable() {
            debug!("Scheduling P{pid} at {}", self.kernel.now());
            baton.schedule();
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let leftovers = self.kernel.unfinished();
        for (pid, name, state) in &leftovers {
            warn!("P{pid} ({name}) still {state} when the simulation ended");
        }
        self.kernel.kill_all(None, None);
        self.drain_ready();
        self.kernel.join_workers();

        // Small simulations never fill the bar on their own.
        self.progress_bar.finish();

        info!(
            "Simulation over at {}s, {} process(es) killed at the end",
            self.kernel.now().as_secs(),
            leftovers.len()
        );
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.finish();
    }
}
