//! Simulated driver: spends per scheduled slot and passes heartbeats around
//! the round, draining every port once per tick.

use std::sync::Arc;

use conductor_core::{Error, Result};
use conductor_kernel::{Kernel, KernelSnapshot, Message};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

pub const DEFAULT_TICKS: u64 = 10;
pub const DEFAULT_SLOT_COST: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimOptions {
    pub ticks: u64,
    /// Tokens charged to an engine for each slot it is scheduled.
    pub slot_cost: u64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_TICKS,
            slot_cost: DEFAULT_SLOT_COST,
        }
    }
}

impl SimOptions {
    /// Options for `ticks` rounds, slot cost from `CONDUCTOR_SLOT_COST`.
    pub fn from_env(ticks: u64) -> Self {
        let slot_cost = std::env::var("CONDUCTOR_SLOT_COST")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_SLOT_COST);
        Self { ticks, slot_cost }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub ticks: u64,
    #[serde(rename = "messagesDelivered")]
    pub messages_delivered: u64,
    #[serde(rename = "messagesRejected")]
    pub messages_rejected: u64,
    /// Engines in the order they first exceeded their budget.
    #[serde(rename = "exceededEvents")]
    pub exceeded_events: Vec<String>,
    pub snapshot: KernelSnapshot,
}

/// Start the kernel, run `options.ticks` rounds, then stop it.
pub fn run(kernel: &mut Kernel, options: &SimOptions) -> Result<SimReport> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    kernel.on_budget_exceeded(move |name| sink.lock().push(name.to_string()));

    let names = kernel.engine_names().to_vec();
    let mut delivered = 0u64;
    let mut rejected = 0u64;

    kernel.start()?;
    for _ in 0..options.ticks {
        let tick = kernel.tick()?;
        let round = &tick.scheduled;

        for (slot, engine) in round.iter().enumerate() {
            kernel.spend(engine, options.slot_cost)?;

            let next = &round[(slot + 1) % round.len()];
            if next == engine {
                continue;
            }
            let heartbeat = Message::new(
                engine.as_str(),
                next.as_str(),
                "heartbeat",
                json!({ "tick": tick.tick_count, "slot": slot }),
            );
            match kernel.send_message(heartbeat) {
                Ok(()) => {}
                Err(Error::MailboxFull { port, .. }) => {
                    warn!(port = %port, "Heartbeat dropped by driver");
                    rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        for name in &names {
            delivered += kernel.receive_messages(name)?.len() as u64;
        }
    }
    kernel.stop()?;

    let exceeded_events = events.lock().clone();
    info!(
        "Simulation complete: ticks={}, delivered={}, rejected={}, exceeded={}",
        options.ticks,
        delivered,
        rejected,
        exceeded_events.len()
    );

    Ok(SimReport {
        ticks: options.ticks,
        messages_delivered: delivered,
        messages_rejected: rejected,
        exceeded_events,
        snapshot: kernel.snapshot(),
    })
}
