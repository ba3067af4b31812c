use std::sync::Arc;

use crate::{
    ExecState, MailboxKey, ProcessId,
    communication::TransferId,
    handoff::Baton,
    kernel::Wakeup,
    process::SlotId,
};

pub(crate) type WaitToken = u64;

/// What a parked process is waiting for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Wait {
    Idle,
    Sleep(WaitToken),
    Send {
        token: WaitToken,
        transfer: TransferId,
    },
    Receive {
        token: WaitToken,
        mailbox: MailboxKey,
        transfer: Option<TransferId>,
    },
    Pause,
}

impl Wait {
    pub(crate) fn token(&self) -> Option<WaitToken> {
        match self {
            Wait::Sleep(token) | Wait::Send { token, .. } | Wait::Receive { token, .. } => {
                Some(*token)
            }
            Wait::Idle | Wait::Pause => None,
        }
    }
}

pub(crate) struct ProcessSlot {
    pub(crate) id: SlotId,
    pub(crate) pid: ProcessId,
    pub(crate) ppid: Option<ProcessId>,
    pub(crate) name: String,
    pub(crate) host: String,
    pub(crate) args: Vec<String>,
    pub(crate) state: ExecState,
    pub(crate) suspended: bool,
    pub(crate) killed: bool,
    /// Sitting in the ready queue.
    pub(crate) queued: bool,
    /// Woke up while suspended; goes back to the ready queue on resume.
    pub(crate) deferred: bool,
    pub(crate) wait: Wait,
    pub(crate) wakeup: Option<Wakeup>,
    pub(crate) baton: Arc<Baton>,
}

impl ProcessSlot {
    pub(crate) fn visible_state(&self) -> ExecState {
        match self.state {
            ExecState::Done | ExecState::Runnable => self.state,
            _ if self.suspended => ExecState::Suspended,
            state => state,
        }
    }
}
