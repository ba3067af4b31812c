use baton::*;

/// Announces itself and naps; long naps get interrupted by the kill.
pub fn sleeper(ctx: &mut Context, args: Vec<String>) -> SimResult<()> {
    let nap: f64 = args
        .first()
        .and_then(|a| a.parse().ok())
        .unwrap_or(10.0);
    log::info!("Hello! I go to sleep for {nap}s.");
    ctx.sleep(nap)?;
    log::info!("OK, goodbye now.");
    Ok(())
}

/// Starts one sleeper every second and kills them all at `deadline`.
pub struct Reaper {
    pub sleepers: usize,
    pub deadline: f64,
}

impl Actor for Reaper {
    fn main(&mut self, ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
        let host = ctx.host();
        let mut started = Vec::new();
        for i in 0..self.sleepers {
            let nap = 5.0 * (i + 1) as f64;
            let pid = ctx.spawn(&host, &format!("sleeper_{i}"), vec![nap.to_string()], sleeper)?;
            started.push(pid);
            ctx.sleep(1.0)?;
        }

        let remaining = self.deadline - ctx.now().as_secs();
        ctx.sleep(remaining.max(0.0))?;
        for pid in started {
            if ctx.state_of(pid)? != ExecState::Done {
                log::info!("Killing P{pid}");
                ctx.kill(pid)?;
            }
        }
        Ok(())
    }
}
