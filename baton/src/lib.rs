mod communication;
mod context;
mod error;
mod handoff;
mod helpers;
mod host;
mod kernel;
mod network;
mod process;
mod progress;
mod random;
mod simulation;
mod simulation_builder;
pub mod time;

pub use communication::{MailboxKey, SenderFilter, Task, mailbox_alias};

pub use context::Context;

pub use error::{SimError, SimResult};

pub use kernel::{Kernel, KernelBridge, Wakeup};

pub use process::{Actor, ExecState, ProcessId, SlotId};

pub use simulation::Simulation;
pub use simulation_builder::SimulationBuilder;

pub use network::{BandwidthDescription, LatencyDescription};

pub use random::{Distributions, Seed};

pub use time::{JIFFIES_PER_SECOND, Jiffies};
