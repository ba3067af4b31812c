use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{
        Arc, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    thread::JoinHandle,
};

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::{
    Actor, ExecState, Jiffies, MailboxKey, ProcessId, SenderFilter, SimError, SimResult, Task,
    communication::{MailboxRegistry, TransferId, Waiter, accepts},
    handoff::Baton,
    host::HostRegistry,
    kernel::{
        KernelBridge, Wakeup,
        slot::{ProcessSlot, Wait, WaitToken},
        transfer::Transfer,
    },
    network::Network,
    process::{SlotId, spawn_worker},
    time::{JIFFIES_PER_SECOND, timer_manager::TimerManager},
};

enum KernelEvent {
    Wake { slot: SlotId, token: WaitToken },
    Deadline { slot: SlotId, token: WaitToken },
    TransferDone(TransferId),
}

/// Deterministic discrete-event kernel.
///
/// Owns simulated time, the process table (an arena of slots indexed by
/// [`SlotId`], looked up by PID), hosts, mailboxes, in-flight transfers and
/// the ready queue. Process threads reach it through [`KernelBridge`]; the
/// [`Simulation`](crate::Simulation) drives it.
pub struct Kernel {
    me: Weak<Kernel>,
    next_pid: AtomicUsize,
    channels: usize,
    state: Mutex<KernelState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

struct KernelState {
    clock: Jiffies,
    slots: Vec<ProcessSlot>,
    by_pid: BTreeMap<ProcessId, SlotId>,
    hosts: HostRegistry,
    mailboxes: MailboxRegistry,
    transfers: HashMap<TransferId, Transfer>,
    timers: TimerManager<KernelEvent>,
    ready: VecDeque<SlotId>,
    network: Network,
    next_id: u64,
}

impl Kernel {
    pub(crate) fn new(
        first_pid: ProcessId,
        channels: usize,
        hosts: HostRegistry,
        network: Network,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            next_pid: AtomicUsize::new(first_pid),
            channels,
            state: Mutex::new(KernelState {
                clock: Jiffies(0),
                slots: Vec::new(),
                by_pid: BTreeMap::new(),
                hosts,
                mailboxes: MailboxRegistry::default(),
                transfers: HashMap::new(),
                timers: TimerManager::new(),
                ready: VecDeque::new(),
                network,
                next_id: 0,
            }),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Pops the next schedulable process and marks it runnable.
    /// Suspended processes popped here are set aside until resumed.
    pub(crate) fn next_runnable(&self) -> Option<(ProcessId, Arc<Baton>)> {
        let mut state = self.state.lock();
        while let Some(id) = state.ready.pop_front() {
            let slot = &mut state.slots[id];
            slot.queued = false;
            if slot.state == ExecState::Done {
                continue;
            }
            if slot.suspended && !slot.killed {
                debug!("P{} is suspended, deferring its wake-up", slot.pid);
                slot.deferred = true;
                continue;
            }
            slot.state = ExecState::Runnable;
            return Some((slot.pid, slot.baton.clone()));
        }
        None
    }

    /// Applies the earliest live timed event if it is due no later than
    /// `horizon`. Stale events are dropped without moving the clock.
    pub(crate) fn fire_next(&self, horizon: Jiffies) -> Option<Jiffies> {
        let mut state = self.state.lock();
        loop {
            let at = state.timers.peek_closest()?;
            if at > horizon {
                return None;
            }
            let (at, event) = state.timers.pop()?;
            if !state.is_live(&event) {
                continue;
            }
            debug_assert!(state.clock <= at, "Future < Present");
            state.clock = at;
            match event {
                KernelEvent::Wake { slot, .. } => state.wake(slot, Wakeup::Slept),
                KernelEvent::Deadline { slot, .. } => {
                    debug!("Deadline hit for P{}", state.slots[slot].pid);
                    state.cancel_wait(slot);
                    state.wake(slot, Wakeup::Timeout);
                }
                KernelEvent::TransferDone(id) => state.complete_transfer(id),
            }
            return Some(at);
        }
    }

    /// Moves the clock forward to `at` once nothing earlier is pending.
    pub(crate) fn advance_to(&self, at: Jiffies) {
        let mut state = self.state.lock();
        if state.clock < at {
            state.clock = at;
        }
    }

    /// Processes that did not reach DONE, with their visible state.
    pub(crate) fn unfinished(&self) -> Vec<(ProcessId, String, ExecState)> {
        let state = self.state.lock();
        state
            .slots
            .iter()
            .filter(|s| s.state != ExecState::Done)
            .map(|s| (s.pid, s.name.clone(), s.visible_state()))
            .collect()
    }

    pub(crate) fn join_workers(&self) {
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for worker in workers {
            if worker.join().is_err() {
                error!("Actor thread ended with a panic");
            }
        }
    }

    fn allocate_pid(&self, state: &KernelState) -> ProcessId {
        loop {
            let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
            if !state.pid_in_use(pid) {
                return pid;
            }
        }
    }

    /// First PID at or above the counter that `allocate_pid` would accept.
    fn settle_next_pid(&self, state: &KernelState) -> ProcessId {
        let mut pid = self.next_pid.load(Ordering::SeqCst);
        while state.pid_in_use(pid) {
            pid += 1;
        }
        self.next_pid.store(pid, Ordering::SeqCst);
        pid
    }
}

impl KernelState {
    fn slot_id(&self, pid: ProcessId) -> SimResult<SlotId> {
        self.by_pid
            .get(&pid)
            .copied()
            .ok_or(SimError::NoSuchProcess(pid))
    }

    fn slot(&self, id: SlotId) -> SimResult<&ProcessSlot> {
        self.slots
            .get(id)
            .ok_or_else(|| SimError::InvalidArgument(format!("unknown process handle {id}")))
    }

    /// Slot of a process that has not finished yet.
    fn live(&self, id: SlotId) -> SimResult<SlotId> {
        let slot = self.slot(id)?;
        if slot.state == ExecState::Done {
            return Err(SimError::NoSuchProcess(slot.pid));
        }
        Ok(id)
    }

    /// Slot of a caller about to block; a killed caller must unwind instead.
    fn blocking(&self, id: SlotId) -> SimResult<SlotId> {
        let id = self.live(id)?;
        if self.slots[id].killed {
            return Err(SimError::ProcessKilled);
        }
        Ok(id)
    }

    /// Held by a process that will keep running. A killed process only
    /// unwinds, so its PID is free again.
    fn pid_in_use(&self, pid: ProcessId) -> bool {
        self.by_pid.get(&pid).is_some_and(|&id| {
            let slot = &self.slots[id];
            slot.state != ExecState::Done && !slot.killed
        })
    }

    fn is_live(&self, event: &KernelEvent) -> bool {
        match *event {
            KernelEvent::Wake { slot, token } => self.slots[slot].wait == Wait::Sleep(token),
            KernelEvent::Deadline { slot, token } => self.slots[slot].wait.token() == Some(token),
            KernelEvent::TransferDone(id) => self.transfers.contains_key(&id),
        }
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn enqueue(&mut self, id: SlotId) {
        let slot = &mut self.slots[id];
        if slot.state == ExecState::Done || slot.queued {
            return;
        }
        slot.queued = true;
        self.ready.push_back(id);
    }

    fn wake(&mut self, id: SlotId, wakeup: Wakeup) {
        let slot = &mut self.slots[id];
        if slot.killed || slot.state == ExecState::Done {
            return;
        }
        debug!("Waking P{} with {wakeup:?}", slot.pid);
        slot.wait = Wait::Idle;
        slot.wakeup = Some(wakeup);
        self.enqueue(id);
    }

    fn arm_deadline(&mut self, id: SlotId, token: WaitToken, timeout: Option<Jiffies>) {
        if let Some(timeout) = timeout {
            let at = self.clock + timeout;
            self.timers
                .schedule(at, KernelEvent::Deadline { slot: id, token });
        }
    }

    fn start_transfer(&mut self, id: TransferId, receiver: SlotId) {
        let Some(transfer) = self.transfers.get_mut(&id) else {
            error!("Transfer #{id} vanished before it started");
            return;
        };
        transfer.receiver = Some(receiver);
        let size = transfer.task.size();
        let from = self.slots[transfer.sender].host.clone();
        let to = self.slots[receiver].host.clone();

        if let Wait::Receive { transfer, .. } = &mut self.slots[receiver].wait {
            *transfer = Some(id);
        }

        let duration = self.network.transfer_time(&from, &to, size);
        let at = self.clock + duration;
        self.timers.schedule(at, KernelEvent::TransferDone(id));
    }

    fn complete_transfer(&mut self, id: TransferId) {
        // Cancelled transfers leave a stale completion event behind.
        let Some(mut transfer) = self.transfers.remove(&id) else {
            return;
        };
        let Some(receiver) = transfer.receiver else {
            error!("Transfer #{id} completed without a receiver");
            return;
        };
        transfer.task.mark_delivered();
        debug!(
            "Transfer #{id} on {} delivered to P{}",
            transfer.mailbox, self.slots[receiver].pid
        );
        self.wake(receiver, Wakeup::Received(transfer.task));
        self.wake(transfer.sender, Wakeup::Sent);
    }

    /// Drops a transfer on behalf of one of its ends. The other end, if it
    /// was already matched, learns about it as a transfer failure.
    fn abort_transfer(&mut self, id: TransferId, initiator: SlotId) {
        let Some(transfer) = self.transfers.remove(&id) else {
            return;
        };
        match transfer.receiver {
            None => {
                self.mailboxes.remove_pending(&transfer.mailbox, id);
            }
            Some(receiver) => {
                let peer = if receiver == initiator {
                    transfer.sender
                } else {
                    receiver
                };
                self.wake(peer, Wakeup::TransferFailure);
            }
        }
    }

    fn cancel_wait(&mut self, id: SlotId) {
        match std::mem::replace(&mut self.slots[id].wait, Wait::Idle) {
            Wait::Send { transfer, .. } => self.abort_transfer(transfer, id),
            Wait::Receive {
                transfer: Some(transfer),
                ..
            } => self.abort_transfer(transfer, id),
            Wait::Receive {
                mailbox,
                transfer: None,
                ..
            } => {
                self.mailboxes.remove_waiter(&mailbox, id);
            }
            Wait::Idle | Wait::Sleep(_) | Wait::Pause => {}
        }
    }

    fn kill_slot(&mut self, id: SlotId) {
        let slot = &mut self.slots[id];
        if slot.state == ExecState::Done || slot.killed {
            return;
        }
        info!("Killing P{} ({})", slot.pid, slot.name);
        slot.killed = true;
        slot.suspended = false;
        slot.deferred = false;
        // The token holder notices on its own, at its next blocking call.
        if slot.state == ExecState::Runnable {
            return;
        }
        self.cancel_wait(id);
        self.slots[id].wakeup = Some(Wakeup::Killed);
        self.enqueue(id);
    }
}

impl KernelBridge for Kernel {
    fn register_process(
        &self,
        parent: Option<ProcessId>,
        host: &str,
        name: &str,
        args: Vec<String>,
        actor: Box<dyn Actor>,
    ) -> SimResult<ProcessId> {
        if name.is_empty() {
            return Err(SimError::InvalidArgument(
                "process name cannot be empty".to_string(),
            ));
        }

        let (pid, id, baton) = {
            let mut state = self.state.lock();
            state.hosts.get_on(host)?;
            let pid = self.allocate_pid(&state);
            let id = state.slots.len();
            let baton = Arc::new(Baton::new());
            state.slots.push(ProcessSlot {
                id,
                pid,
                ppid: parent,
                name: name.to_string(),
                host: host.to_string(),
                args,
                state: ExecState::New,
                suspended: false,
                killed: false,
                queued: false,
                deferred: false,
                wait: Wait::Idle,
                wakeup: None,
                baton: baton.clone(),
            });
            state.by_pid.insert(pid, id);
            state.hosts.attach(host, id);
            state.enqueue(id);
            (pid, id, baton)
        };

        let kernel: Arc<dyn KernelBridge> = self.me.upgrade().expect("Kernel is gone");
        let worker = spawn_worker(kernel, pid, id, name, baton, actor);
        self.workers.lock().push(worker);
        info!("P{pid} ({name}) created on {host}");
        Ok(pid)
    }

    fn lookup(&self, pid: ProcessId) -> SimResult<SlotId> {
        self.state.lock().slot_id(pid)
    }

    fn notify_blocked(&self, id: SlotId) {
        let mut state = self.state.lock();
        if state.slot(id).is_ok() {
            let slot = &mut state.slots[id];
            slot.state = if slot.wait == Wait::Pause {
                ExecState::Suspended
            } else {
                ExecState::Blocked
            };
            debug!("P{} parks as {}", slot.pid, slot.state);
        }
    }

    fn notify_runnable(&self, id: SlotId) {
        let mut state = self.state.lock();
        if state.slot(id).is_ok() {
            state.slots[id].state = ExecState::Runnable;
        }
    }

    fn notify_done(&self, id: SlotId) {
        let mut state = self.state.lock();
        if state.slot(id).is_err() {
            return;
        }
        let slot = &mut state.slots[id];
        slot.state = ExecState::Done;
        slot.wait = Wait::Idle;
        let (pid, host) = (slot.pid, slot.host.clone());
        state.hosts.detach(&host, id);
        info!("P{pid} is done");
    }

    fn suspend(&self, id: SlotId) -> SimResult<()> {
        let mut state = self.state.lock();
        let id = state.live(id)?;
        let slot = &mut state.slots[id];
        if slot.state == ExecState::Runnable {
            // The caller pauses itself, which blocks.
            if slot.killed {
                return Err(SimError::ProcessKilled);
            }
            slot.wait = Wait::Pause;
        }
        slot.suspended = true;
        info!("P{} suspended", slot.pid);
        Ok(())
    }

    fn resume(&self, id: SlotId) -> SimResult<()> {
        let mut state = self.state.lock();
        let id = state.live(id)?;
        let slot = &mut state.slots[id];
        if !slot.suspended {
            return Ok(());
        }
        slot.suspended = false;
        info!("P{} resumed", slot.pid);
        if slot.wait == Wait::Pause {
            state.wake(id, Wakeup::Resumed);
        } else if slot.deferred {
            slot.deferred = false;
            state.enqueue(id);
        }
        Ok(())
    }

    fn kill(&self, id: SlotId) -> SimResult<()> {
        let mut state = self.state.lock();
        state.slot(id)?;
        state.kill_slot(id);
        Ok(())
    }

    fn kill_all(&self, except: Option<SlotId>, reset_pid: Option<ProcessId>) -> ProcessId {
        let mut state = self.state.lock();
        let victims: Vec<SlotId> = state
            .slots
            .iter()
            .filter(|s| s.state != ExecState::Done && Some(s.id) != except)
            .map(|s| s.id)
            .collect();
        for id in victims {
            state.kill_slot(id);
        }
        if let Some(reset) = reset_pid {
            self.next_pid.store(reset, Ordering::SeqCst);
        }
        self.settle_next_pid(&state)
    }

    fn migrate(&self, id: SlotId, host: &str) -> SimResult<()> {
        let mut state = self.state.lock();
        state.hosts.get_on(host)?;
        let id = state.live(id)?;
        let from = std::mem::replace(&mut state.slots[id].host, host.to_string());
        state.hosts.detach(&from, id);
        state.hosts.attach(host, id);
        info!("P{} migrated from {from} to {host}", state.slots[id].pid);
        Ok(())
    }

    fn fail_host(&self, host: &str) -> SimResult<()> {
        let mut state = self.state.lock();
        let victims = state.hosts.switch_off(host)?;
        warn!("Host {host} switched off, {} process(es) on it", victims.len());
        for id in victims {
            state.kill_slot(id);
        }
        Ok(())
    }

    fn deliver_task(
        &self,
        from: SlotId,
        mailbox: &MailboxKey,
        mut task: Task,
        timeout: Option<Jiffies>,
    ) -> SimResult<()> {
        task.validate()?;
        let mut state = self.state.lock();
        let id = state.blocking(from)?;
        if let MailboxKey::Channel { host, .. } = mailbox {
            state.hosts.get_on(host)?;
        }

        let (pid, sender_host) = (state.slots[id].pid, state.slots[id].host.clone());
        task.stamp(pid, &sender_host);
        let transfer = state.fresh_id();
        let token = state.fresh_id();
        state.transfers.insert(
            transfer,
            Transfer {
                task,
                mailbox: mailbox.clone(),
                sender: id,
                receiver: None,
            },
        );
        state.slots[id].wait = Wait::Send { token, transfer };
        debug!("P{pid} puts transfer #{transfer} on {mailbox}");

        let waiter = {
            let KernelState {
                mailboxes,
                transfers,
                ..
            } = &mut *state;
            let task = &transfers[&transfer].task;
            mailboxes.take_waiter(mailbox, |w| accepts(w.filter.as_ref(), task))
        };
        match waiter {
            Some(waiter) => state.start_transfer(transfer, waiter.slot),
            None => state.mailboxes.push_pending(mailbox, transfer),
        }
        state.arm_deadline(id, token, timeout);
        Ok(())
    }

    fn await_task(
        &self,
        id: SlotId,
        mailbox: &MailboxKey,
        timeout: Option<Jiffies>,
        filter: Option<SenderFilter>,
    ) -> SimResult<()> {
        let mut state = self.state.lock();
        let id = state.blocking(id)?;
        let token = state.fresh_id();
        state.slots[id].wait = Wait::Receive {
            token,
            mailbox: mailbox.clone(),
            transfer: None,
        };
        debug!("P{} waits on {mailbox}", state.slots[id].pid);

        let found = {
            let KernelState {
                mailboxes,
                transfers,
                ..
            } = &mut *state;
            mailboxes.take_pending(mailbox, |t| accepts(filter.as_ref(), &transfers[&t].task))
        };
        match found {
            Some(transfer) => state.start_transfer(transfer, id),
            None => state
                .mailboxes
                .push_waiter(mailbox, Waiter { slot: id, filter }),
        }
        state.arm_deadline(id, token, timeout);
        Ok(())
    }

    fn sleep(&self, id: SlotId, duration: Jiffies) -> SimResult<()> {
        let mut state = self.state.lock();
        let id = state.blocking(id)?;
        let token = state.fresh_id();
        state.slots[id].wait = Wait::Sleep(token);
        let at = state.clock + duration;
        state
            .timers
            .schedule(at, KernelEvent::Wake { slot: id, token });
        Ok(())
    }

    fn compute_time(&self, id: SlotId, flops: f64) -> SimResult<Jiffies> {
        let state = self.state.lock();
        let host = &state.slot(id)?.host;
        let speed = state.hosts.get(host)?.speed();
        let secs = flops / speed;
        Ok(Jiffies((secs * JIFFIES_PER_SECOND as f64).round() as usize))
    }

    fn take_wakeup(&self, id: SlotId) -> Option<Wakeup> {
        let mut state = self.state.lock();
        let slot = state.slots.get_mut(id)?;
        let wakeup = slot.wakeup.take();
        if slot.killed {
            return Some(Wakeup::Killed);
        }
        wakeup
    }

    fn channel_mailbox(&self, host: &str, channel: usize) -> SimResult<MailboxKey> {
        let state = self.state.lock();
        state.hosts.get(host)?;
        if channel >= self.channels {
            return Err(SimError::InvalidArgument(format!(
                "invalid channel {channel}, only {} configured",
                self.channels
            )));
        }
        Ok(MailboxKey::Channel {
            host: host.to_string(),
            channel,
        })
    }

    fn listen(&self, mailbox: &MailboxKey) -> bool {
        let state = self.state.lock();
        state
            .mailboxes
            .by_key(mailbox)
            .is_some_and(|m| m.pending().next().is_some())
    }

    fn listen_from_host(&self, mailbox: &MailboxKey, host: &str) -> usize {
        let state = self.state.lock();
        state.mailboxes.by_key(mailbox).map_or(0, |m| {
            m.pending()
                .filter(|t| state.transfers[t].task.source_host() == Some(host))
                .count()
        })
    }

    fn listen_from(&self, mailbox: &MailboxKey) -> Option<ProcessId> {
        let state = self.state.lock();
        let head = state.mailboxes.by_key(mailbox)?.pending().next()?;
        state.transfers[&head].task.sender()
    }

    fn now(&self) -> Jiffies {
        self.state.lock().clock
    }

    fn name_of(&self, id: SlotId) -> SimResult<String> {
        Ok(self.state.lock().slot(id)?.name.clone())
    }

    fn host_of(&self, id: SlotId) -> SimResult<String> {
        Ok(self.state.lock().slot(id)?.host.clone())
    }

    fn args_of(&self, id: SlotId) -> Vec<String> {
        self.state
            .lock()
            .slot(id)
            .map(|s| s.args.clone())
            .unwrap_or_default()
    }

    fn ppid_of(&self, id: SlotId) -> SimResult<Option<ProcessId>> {
        Ok(self.state.lock().slot(id)?.ppid)
    }

    fn state_of(&self, id: SlotId) -> SimResult<ExecState> {
        Ok(self.state.lock().slot(id)?.visible_state())
    }

    fn is_suspended(&self, id: SlotId) -> SimResult<bool> {
        let state = self.state.lock();
        let slot = state.slot(id)?;
        Ok(slot.suspended && slot.state != ExecState::Done)
    }

    fn is_killed(&self, id: SlotId) -> bool {
        self.state.lock().slot(id).is_ok_and(|s| s.killed)
    }
}
