//! What actor code sees of the simulation.
//!
//! Each process gets its own `Context`, handed to [`Actor::main`]. Every
//! method taking `&mut self` that can block (`sleep`, `execute`, `send`,
//! `receive`, `put`, `get`, pausing oneself) is a suspension point: the
//! token goes back to the kernel and the call returns once the kernel
//! schedules this process again. Durations and timeouts are in simulated
//! seconds.

use std::sync::Arc;

use log::{debug, error};

use crate::{
    Actor, ExecState, Jiffies, MailboxKey, ProcessId, SenderFilter, SimError, SimResult, Task,
    communication::mailbox_alias,
    handoff::Baton,
    kernel::{KernelBridge, Wakeup},
    process::SlotId,
};

pub struct Context {
    kernel: Arc<dyn KernelBridge>,
    pid: ProcessId,
    slot: SlotId,
    baton: Arc<Baton>,
}

fn to_timeout(timeout: Option<f64>) -> SimResult<Option<Jiffies>> {
    timeout.map(Jiffies::from_secs).transpose()
}

impl Context {
    pub(crate) fn new(
        kernel: Arc<dyn KernelBridge>,
        pid: ProcessId,
        slot: SlotId,
        baton: Arc<Baton>,
    ) -> Self {
        Self {
            kernel,
            pid,
            slot,
            baton,
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// PID of the process that spawned this one, if any.
    pub fn ppid(&self) -> Option<ProcessId> {
        self.kernel.ppid_of(self.slot).ok().flatten()
    }

    pub fn name(&self) -> String {
        self.kernel.name_of(self.slot).unwrap_or_default()
    }

    /// Current host. Changes when the process migrates.
    pub fn host(&self) -> String {
        self.kernel.host_of(self.slot).unwrap_or_default()
    }

    /// Arguments the process was created with.
    pub fn args(&self) -> Vec<String> {
        self.kernel.args_of(self.slot)
    }

    pub fn now(&self) -> Jiffies {
        self.kernel.now()
    }

    /// `"<currentHostName>:<processName>"`.
    pub fn own_mailbox(&self) -> String {
        mailbox_alias(&self.host(), &self.name())
    }

    pub fn process_name(&self, pid: ProcessId) -> SimResult<String> {
        self.kernel.name_of(self.handle(pid)?)
    }

    pub fn process_host(&self, pid: ProcessId) -> SimResult<String> {
        self.kernel.host_of(self.handle(pid)?)
    }

    pub fn state_of(&self, pid: ProcessId) -> SimResult<ExecState> {
        self.kernel.state_of(self.handle(pid)?)
    }

    pub fn sleep(&mut self, secs: f64) -> SimResult<()> {
        let duration = Jiffies::from_secs(secs)?;
        self.sleep_for(duration)
    }

    /// Occupies the current host for the compute cost of `task`.
    pub fn execute(&mut self, task: &Task) -> SimResult<()> {
        task.validate()?;
        let duration = self.kernel.compute_time(self.slot, task.compute_cost())?;
        debug!("P{} executes {} for {duration}", self.pid, task.name());
        self.sleep_for(duration)
    }

    /// Sends `task` to the mailbox `alias` and waits until it is delivered.
    pub fn send(&mut self, alias: &str, task: Task, timeout: Option<f64>) -> SimResult<()> {
        self.put_to(&MailboxKey::Alias(alias.to_string()), task, timeout)
    }

    /// Waits for a task on the mailbox `alias`, optionally only one whose
    /// sender matches `filter`.
    pub fn receive(
        &mut self,
        alias: &str,
        timeout: Option<f64>,
        filter: Option<SenderFilter>,
    ) -> SimResult<Task> {
        self.get_from(&MailboxKey::Alias(alias.to_string()), timeout, filter)
    }

    /// Legacy addressing: sends to `channel` of `host`.
    pub fn put(
        &mut self,
        host: &str,
        channel: usize,
        task: Task,
        timeout: Option<f64>,
    ) -> SimResult<()> {
        let mailbox = self.kernel.channel_mailbox(host, channel)?;
        self.put_to(&mailbox, task, timeout)
    }

    /// Legacy addressing: receives on `channel` of the current host.
    pub fn get(
        &mut self,
        channel: usize,
        timeout: Option<f64>,
        filter: Option<SenderFilter>,
    ) -> SimResult<Task> {
        let mailbox = self.kernel.channel_mailbox(&self.host(), channel)?;
        self.get_from(&mailbox, timeout, filter)
    }

    /// Whether a task waits on `channel` of the current host.
    pub fn probe(&self, channel: usize) -> SimResult<bool> {
        let mailbox = self.kernel.channel_mailbox(&self.host(), channel)?;
        Ok(self.kernel.listen(&mailbox))
    }

    /// Whether a task waits in mailbox `alias`.
    pub fn listen(&self, alias: &str) -> bool {
        self.kernel.listen(&MailboxKey::Alias(alias.to_string()))
    }

    /// Number of tasks waiting in `alias` that were sent from `host`.
    pub fn listen_from_host(&self, alias: &str, host: &str) -> usize {
        self.kernel
            .listen_from_host(&MailboxKey::Alias(alias.to_string()), host)
    }

    /// Sender of the oldest task waiting in `alias`.
    pub fn listen_from(&self, alias: &str) -> Option<ProcessId> {
        self.kernel.listen_from(&MailboxKey::Alias(alias.to_string()))
    }

    pub fn spawn(
        &mut self,
        host: &str,
        name: &str,
        args: Vec<String>,
        actor: impl Actor,
    ) -> SimResult<ProcessId> {
        self.kernel
            .register_process(Some(self.pid), host, name, args, Box::new(actor))
    }

    /// Suspends `pid`. Pausing oneself blocks until someone resumes us.
    /// A killed caller
    /// gets `ProcessKilled` instead.
    pub fn pause(&mut self, pid: ProcessId) -> SimResult<()> {
        let slot = self.handle(pid)?;
        self.kernel.suspend(slot)?;
        if slot != self.slot {
            return Ok(());
        }
        match self.block()? {
            Wakeup::Resumed => Ok(()),
            other => Err(self.unexpected("pause", other)),
        }
    }

    pub fn resume(&mut self, pid: ProcessId) -> SimResult<()> {
        self.kernel.resume(self.handle(pid)?)
    }

    pub fn is_suspended(&self, pid: ProcessId) -> SimResult<bool> {
        self.kernel.is_suspended(self.handle(pid)?)
    }

    /// Killing oneself returns `ProcessKilled`, to be propagated out of main.
    pub fn kill(&mut self, pid: ProcessId) -> SimResult<()> {
        let slot = self.handle(pid)?;
        self.kernel.kill(slot)?;
        if slot == self.slot {
            return Err(SimError::ProcessKilled);
        }
        Ok(())
    }

    /// Kills every other process. With `reset_pid`, processes created
    /// afterwards are numbered from there. Returns the next PID.
    pub fn kill_all(&mut self, reset_pid: Option<ProcessId>) -> ProcessId {
        self.kernel.kill_all(Some(self.slot), reset_pid)
    }

    /// Moves `pid` to `host`. Not a suspension point.
    pub fn migrate(&mut self, pid: ProcessId, host: &str) -> SimResult<()> {
        self.kernel.migrate(self.handle(pid)?, host)
    }

    /// Switches `host` off, killing everything on it (possibly ourselves).
    pub fn fail_host(&mut self, host: &str) -> SimResult<()> {
        self.kernel.fail_host(host)?;
        if self.kernel.is_killed(self.slot) {
            return Err(SimError::ProcessKilled);
        }
        Ok(())
    }

    fn sleep_for(&mut self, duration: Jiffies) -> SimResult<()> {
        self.kernel.sleep(self.slot, duration)?;
        match self.block()? {
            Wakeup::Slept => Ok(()),
            other => Err(self.unexpected("sleep", other)),
        }
    }

    fn put_to(&mut self, mailbox: &MailboxKey, task: Task, timeout: Option<f64>) -> SimResult<()> {
        let timeout = to_timeout(timeout)?;
        self.kernel.deliver_task(self.slot, mailbox, task, timeout)?;
        match self.block()? {
            Wakeup::Sent => Ok(()),
            Wakeup::Timeout => Err(SimError::Timeout),
            Wakeup::TransferFailure => Err(SimError::TransferFailure),
            other => Err(self.unexpected("put", other)),
        }
    }

    fn get_from(
        &mut self,
        mailbox: &MailboxKey,
        timeout: Option<f64>,
        filter: Option<SenderFilter>,
    ) -> SimResult<Task> {
        let timeout = to_timeout(timeout)?;
        self.kernel.await_task(self.slot, mailbox, timeout, filter)?;
        match self.block()? {
            Wakeup::Received(task) => Ok(task),
            Wakeup::Timeout => Err(SimError::Timeout),
            Wakeup::TransferFailure => Err(SimError::TransferFailure),
            other => Err(self.unexpected("get", other)),
        }
    }

    /// The suspension point: park, then report why we were scheduled again.
    fn block(&mut self) -> SimResult<Wakeup> {
        self.kernel.notify_blocked(self.slot);
        self.baton.unschedule();
        self.kernel.notify_runnable(self.slot);
        match self.kernel.take_wakeup(self.slot) {
            Some(Wakeup::Killed) => Err(SimError::ProcessKilled),
            Some(wakeup) => Ok(wakeup),
            None => Err(self.inconsistency(format!(
                "P{} scheduled without a wake-up reason",
                self.pid
            ))),
        }
    }

    fn unexpected(&self, call: &str, wakeup: Wakeup) -> SimError {
        self.inconsistency(format!("P{} woke up from {call} with {wakeup:?}", self.pid))
    }

    fn inconsistency(&self, reason: String) -> SimError {
        error!("{reason}");
        SimError::Internal(reason)
    }

    /// Our own PID may have been handed out again by `kill_all`.
    fn handle(&self, pid: ProcessId) -> SimResult<SlotId> {
        if pid == self.pid {
            return Ok(self.slot);
        }
        self.kernel.lookup(pid)
    }
}
