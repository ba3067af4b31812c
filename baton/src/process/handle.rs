//! The capability every simulated process implements.

use crate::{Context, SimResult};

/// Unique identifier of a process for the lifetime of a simulation.
///
/// PIDs are handed out in creation order by the kernel and are never reused,
/// unless the program explicitly resets the counter with `kill_all`.
pub type ProcessId = usize;

/// Kernel-side handle of a process: its index in the process table.
/// Unlike a PID it is never handed out twice.
pub type SlotId = usize;

/// Sequential, blocking logic of one simulated process.
///
/// `main` runs on a dedicated thread, but only while the process holds the
/// execution token. Every blocking call on [`Context`] (`sleep`, `send`,
/// `receive`, `execute`, pausing itself) hands the token back to the kernel
/// and returns once the kernel schedules the process again.
///
/// Errors from blocking calls must be propagated with `?` when they are
/// [`SimError::ProcessKilled`]; any other error returned from `main` is
/// treated as a bug in the actor and stops the whole simulation.
///
/// # Examples
///
/// ```rust
/// use baton::{Actor, Context, SimResult};
///
/// struct Slave;
///
/// impl Actor for Slave {
///     fn main(&mut self, ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
///         log::info!("Hello!");
///         ctx.sleep(10.0)?;
///         log::info!("OK, goodbye now.");
///         Ok(())
///     }
/// }
/// ```
///
/// Closures with the same signature are actors too.
///
/// [`SimError::ProcessKilled`]: crate::SimError::ProcessKilled
pub trait Actor: Send + 'static {
    fn main(&mut self, ctx: &mut Context, args: Vec<String>) -> SimResult<()>;
}

impl<F> Actor for F
where
    F: FnMut(&mut Context, Vec<String>) -> SimResult<()> + Send + 'static,
{
    fn main(&mut self, ctx: &mut Context, args: Vec<String>) -> SimResult<()> {
        self(ctx, args)
    }
}
