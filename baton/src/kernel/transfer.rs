use crate::{MailboxKey, communication::Task, process::SlotId};

/// A send between its `put` and its completion (or cancellation).
pub(crate) struct Transfer {
    pub(crate) task: Task,
    pub(crate) mailbox: MailboxKey,
    pub(crate) sender: SlotId,
    /// Set once matched with a receiver; the transfer is then in flight.
    pub(crate) receiver: Option<SlotId>,
}
