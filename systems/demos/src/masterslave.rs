use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use baton::*;

pub const FINALIZE: &str = "finalize";

/// Hands out `tasks` jobs round-robin, then tells every slave to stop.
pub struct Master {
    pub tasks: usize,
    pub compute_cost: f64,
    pub size: f64,
    pub slaves: Vec<String>,
}

impl Actor for Master {
    fn main(&mut self, ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
        for i in 0..self.tasks {
            let slave = &self.slaves[i % self.slaves.len()];
            let task = Task::new(&format!("Task_{i}"), self.compute_cost, self.size);
            debug_process!(ctx, "Sending {} to {slave}", task.name());
            ctx.send(slave, task, None)?;
        }

        log::info!("All tasks have been dispatched. Let's tell everybody the computation is over.");
        for slave in &self.slaves {
            ctx.send(slave, Task::new(FINALIZE, 0.0, 0.0), None)?;
        }
        log::info!("Goodbye now!");
        Ok(())
    }
}

/// Executes whatever lands in its own mailbox until told to stop.
pub struct Slave {
    pub executed: Arc<AtomicUsize>,
}

impl Actor for Slave {
    fn main(&mut self, ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
        let mailbox = ctx.own_mailbox();
        loop {
            let task = ctx.receive(&mailbox, None, None)?;
            if task.name() == FINALIZE {
                break;
            }
            debug_process!(ctx, "Processing {}", task.name());
            ctx.execute(&task)?;
            self.executed.fetch_add(1, Ordering::Relaxed);
        }
        log::info!("I'm done. See you!");
        Ok(())
    }
}
