mod handle;
mod state;
mod worker;

pub use handle::Actor;
pub use handle::ProcessId;
pub use handle::SlotId;
pub use state::ExecState;
pub(crate) use worker::spawn_worker;
