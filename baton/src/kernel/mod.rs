//! The boundary between process threads and the discrete-event kernel.
//!
//! [`KernelBridge`] is everything a process needs from the engine that owns
//! simulated time. Registration, bookkeeping and the non-blocking half of
//! each messaging call go through it; the blocking half is always the same
//! handoff (`unschedule`, then [`KernelBridge::take_wakeup`] once scheduled
//! again). [`Kernel`] is the in-process deterministic implementation.

mod engine;
mod slot;
mod transfer;

pub use engine::Kernel;

use crate::{
    Actor, ExecState, Jiffies, MailboxKey, ProcessId, SenderFilter, SimResult, Task,
    process::SlotId,
};

/// Why a parked process was scheduled again.
#[derive(Debug)]
pub enum Wakeup {
    Slept,
    Sent,
    Received(Task),
    Resumed,
    Timeout,
    TransferFailure,
    Killed,
}

/// Process-facing operations of the kernel.
///
/// Operations address a process by its [`SlotId`] handle, which stays valid
/// for the life of the simulation. PIDs are only resolved through
/// [`KernelBridge::lookup`], since `kill_all` may hand a PID out again while
/// its previous owner is still unwinding.
pub trait KernelBridge: Send + Sync {
    /// Creates the process and its parked thread. It starts running on its
    /// first schedule.
    fn register_process(
        &self,
        parent: Option<ProcessId>,
        host: &str,
        name: &str,
        args: Vec<String>,
        actor: Box<dyn Actor>,
    ) -> SimResult<ProcessId>;
    /// Handle of the newest process that was given `pid`.
    fn lookup(&self, pid: ProcessId) -> SimResult<SlotId>;

    /// The process is about to park inside a blocking call.
    fn notify_blocked(&self, slot: SlotId);
    /// The process was handed the token.
    fn notify_runnable(&self, slot: SlotId);
    /// `main` returned or unwound; the process will park one last time.
    fn notify_done(&self, slot: SlotId);

    fn suspend(&self, slot: SlotId) -> SimResult<()>;
    fn resume(&self, slot: SlotId) -> SimResult<()>;
    fn kill(&self, slot: SlotId) -> SimResult<()>;
    /// Kills everybody but `except`; returns the PID the next process gets.
    fn kill_all(&self, except: Option<SlotId>, reset_pid: Option<ProcessId>) -> ProcessId;
    fn migrate(&self, slot: SlotId, host: &str) -> SimResult<()>;
    fn fail_host(&self, host: &str) -> SimResult<()>;

    /// Posts a send on behalf of `from`, which must block right after.
    fn deliver_task(
        &self,
        from: SlotId,
        mailbox: &MailboxKey,
        task: Task,
        timeout: Option<Jiffies>,
    ) -> SimResult<()>;
    /// Posts a receive on behalf of `slot`, which must block right after.
    fn await_task(
        &self,
        slot: SlotId,
        mailbox: &MailboxKey,
        timeout: Option<Jiffies>,
        filter: Option<SenderFilter>,
    ) -> SimResult<()>;
    /// Arms a wake-up for `slot`, which must block right after.
    fn sleep(&self, slot: SlotId, duration: Jiffies) -> SimResult<()>;
    /// Time needed to compute `flops` on the current host of `slot`.
    fn compute_time(&self, slot: SlotId, flops: f64) -> SimResult<Jiffies>;
    /// Why `slot` was scheduled again. `None` means the kernel lost track.
    fn take_wakeup(&self, slot: SlotId) -> Option<Wakeup>;

    fn channel_mailbox(&self, host: &str, channel: usize) -> SimResult<MailboxKey>;
    fn listen(&self, mailbox: &MailboxKey) -> bool;
    fn listen_from_host(&self, mailbox: &MailboxKey, host: &str) -> usize;
    fn listen_from(&self, mailbox: &MailboxKey) -> Option<ProcessId>;

    fn now(&self) -> Jiffies;
    fn name_of(&self, slot: SlotId) -> SimResult<String>;
    fn host_of(&self, slot: SlotId) -> SimResult<String>;
    fn args_of(&self, slot: SlotId) -> Vec<String>;
    fn ppid_of(&self, slot: SlotId) -> SimResult<Option<ProcessId>>;
    fn state_of(&self, slot: SlotId) -> SimResult<ExecState>;
    fn is_suspended(&self, slot: SlotId) -> SimResult<bool>;
    fn is_killed(&self, slot: SlotId) -> bool;
}
