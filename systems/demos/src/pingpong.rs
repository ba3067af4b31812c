use std::sync::{Arc, Mutex};

use baton::*;

/// Sends one ping, waits for the pong and records the round trip.
pub struct Pinger {
    pub peer: String,
    pub size: f64,
    pub round_trip: Arc<Mutex<Option<f64>>>,
}

impl Actor for Pinger {
    fn main(&mut self, ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
        let start = ctx.now();
        ctx.send(&self.peer, Task::new("ping", 0.0, self.size).with_payload(start), None)?;

        let pong = ctx.receive(&ctx.own_mailbox(), None, None)?;
        let elapsed = (ctx.now() - start).as_secs();
        log::info!("Got {} after {elapsed}s", pong.name());
        if let Ok(mut round_trip) = self.round_trip.lock() {
            *round_trip = Some(elapsed);
        }
        Ok(())
    }
}

/// Answers a single ping on its own mailbox.
pub struct Ponger {
    pub size: f64,
}

impl Actor for Ponger {
    fn main(&mut self, ctx: &mut Context, _args: Vec<String>) -> SimResult<()> {
        let mut ping = ctx.receive(&ctx.own_mailbox(), None, None)?;
        let sent_at = ping.take_payload::<Jiffies>().unwrap_or_default();
        debug_process!(ctx, "Ping took {}s", (ctx.now() - sent_at).as_secs());

        let sender = ping.sender().ok_or_else(|| {
            SimError::InvalidArgument("delivered task without a sender".to_string())
        })?;
        let reply_to = mailbox_alias(&ctx.process_host(sender)?, &ctx.process_name(sender)?);
        ctx.send(&reply_to, Task::new("pong", 0.0, self.size), None)
    }
}
