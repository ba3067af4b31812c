use std::sync::{Arc, Mutex};

use baton::*;

/// Pauses itself as soon as it starts, then sleeps once resumed.
pub fn lazy_guy(ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
    log::info!("Nobody's watching me ? Let's go to sleep.");
    ctx.pause(ctx.pid())?;
    log::info!("Uuuh ? Did somebody call me ?");
    ctx.sleep(10.0)?;
    log::info!("Mmmh, goodbye now.");
    Ok(())
}

/// Wakes the lazy guy up after a while and records what it saw.
pub struct DreamMaster {
    pub observed: Arc<Mutex<Vec<(f64, ExecState)>>>,
}

impl DreamMaster {
    fn observe(&self, ctx: &Context, pid: ProcessId) -> SimResult<()> {
        let state = ctx.state_of(pid)?;
        if let Ok(mut observed) = self.observed.lock() {
            observed.push((ctx.now().as_secs(), state));
        }
        Ok(())
    }
}

impl Actor for DreamMaster {
    fn main(&mut self, ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
        log::info!("Let's create a lazy guy.");
        let host = ctx.host();
        let lazy = ctx.spawn(&host, "lazy_guy", Vec::new(), lazy_guy)?;
        log::info!("Let's wait a little bit...");
        ctx.sleep(10.0)?;
        self.observe(ctx, lazy)?;

        log::info!("Let's wake the lazy guy up! >:) BOOOOOUUUHHH!!!!");
        ctx.resume(lazy)?;
        ctx.sleep(5.0)?;
        self.observe(ctx, lazy)?;

        log::info!("Let's pause him again in the middle of his nap.");
        ctx.pause(lazy)?;
        ctx.sleep(20.0)?;
        self.observe(ctx, lazy)?;

        ctx.resume(lazy)?;
        log::info!("OK, goodbye now.");
        Ok(())
    }
}
