mod filter;
mod mailbox;
mod task;

pub use filter::SenderFilter;
pub(crate) use filter::accepts;
pub use mailbox::{MailboxKey, mailbox_alias};
pub(crate) use mailbox::{MailboxRegistry, TransferId, Waiter};
pub use task::Task;
