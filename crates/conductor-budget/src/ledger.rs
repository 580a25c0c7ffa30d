//! Per-engine ledger entries plus the shared headroom pool.
//!
//! Allocation for an engine registered with percentage `p` is
//! `p/100 * total * (1 - headroom/100)`. The remaining `headroom` percent of
//! the total forms a single pool that only burst overdraft draws on.

use std::collections::HashMap;

use conductor_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::types::BudgetStatus;

/// Handler invoked with the engine name when an engine becomes exceeded.
pub type ExceededCallback = Box<dyn Fn(&str) + Send + Sync>;

struct LedgerEntry {
    allocation: f64,
    spent: u64,
    burst_active: bool,
    /// Burst overdraft that was backed by non-negative headroom when drawn.
    burst_covered: f64,
    /// One-shot guard for the exceedance callback; cleared by reset.
    exceeded_fired: bool,
}

impl LedgerEntry {
    fn new(allocation: f64) -> Self {
        Self {
            allocation,
            spent: 0,
            burst_active: false,
            burst_covered: 0.0,
            exceeded_fired: false,
        }
    }

    fn remaining(&self) -> f64 {
        self.allocation - self.spent as f64
    }

    fn is_exceeded(&self) -> bool {
        self.remaining() + self.burst_covered < 0.0
    }

    fn reset(&mut self) {
        self.spent = 0;
        self.burst_covered = 0.0;
        self.exceeded_fired = false;
    }
}

/// Token ledger for a closed set of engines.
pub struct BudgetManager {
    total_budget: u64,
    headroom_percent: f64,
    initial_headroom: f64,
    headroom: f64,
    entries: HashMap<String, LedgerEntry>,
    order: Vec<String>,
    observers: Vec<ExceededCallback>,
}

impl BudgetManager {
    /// Create a ledger. `headroom_percent` is expected in `[0, 100)`.
    pub fn new(total_budget: u64, headroom_percent: f64) -> Self {
        let initial_headroom = total_budget as f64 * headroom_percent / 100.0;
        Self {
            total_budget,
            headroom_percent,
            initial_headroom,
            headroom: initial_headroom,
            entries: HashMap::new(),
            order: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn total_budget(&self) -> u64 {
        self.total_budget
    }

    pub fn headroom_percent(&self) -> f64 {
        self.headroom_percent
    }

    /// Headroom at construction and after [`reset_all`](Self::reset_all).
    pub fn initial_headroom(&self) -> f64 {
        self.initial_headroom
    }

    /// Current headroom: the initial pool minus cumulative burst draw.
    /// Negative when burst overdraft has oversubscribed the pool.
    pub fn headroom(&self) -> f64 {
        self.headroom
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Register an engine with a percentage share and return its allocation.
    pub fn register_engine(&mut self, name: &str, percentage: f64) -> Result<f64> {
        if !percentage.is_finite() || percentage < 0.0 {
            return Err(Error::Config(format!(
                "engine {} has invalid budget percentage {}",
                name, percentage
            )));
        }
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateEngine(name.to_string()));
        }

        // Integer-valued inputs stay exact in f64 with a single final division.
        let allocation =
            percentage * self.total_budget as f64 * (100.0 - self.headroom_percent) / 10_000.0;
        self.entries
            .insert(name.to_string(), LedgerEntry::new(allocation));
        self.order.push(name.to_string());

        debug!(engine = name, percentage, allocation, "Registered budget");
        Ok(allocation)
    }

    /// Charge `tokens` to an engine. Never fails for overspend.
    ///
    /// With burst active, the part of this spend beyond the engine's
    /// allocation is also drawn from headroom. The part the pool could
    /// actually cover keeps the engine from counting as exceeded.
    pub fn spend(&mut self, name: &str, tokens: u64) -> Result<BudgetStatus> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| Error::UnknownEngine(name.to_string()))?;

        let before = entry.spent as f64;
        entry.spent = entry.spent.saturating_add(tokens);
        let after = entry.spent as f64;

        if entry.burst_active {
            let overdraft = after - before.max(entry.allocation);
            if overdraft > 0.0 {
                let covered = overdraft.min(self.headroom.max(0.0));
                entry.burst_covered += covered;
                self.headroom -= overdraft;
                debug!(
                    engine = name,
                    overdraft,
                    covered,
                    headroom = self.headroom,
                    "Burst draw from headroom"
                );
            }
        }

        let fire = entry.is_exceeded() && !entry.exceeded_fired;
        if fire {
            entry.exceeded_fired = true;
        }
        let status = status_of(name, entry);

        if fire {
            warn!(
                engine = name,
                spent = status.spent,
                allocation = status.allocation,
                headroom = self.headroom,
                "Engine budget exceeded"
            );
            for observer in &self.observers {
                observer(name);
            }
        }

        Ok(status)
    }

    pub fn enable_burst(&mut self, name: &str) -> Result<()> {
        self.entry_mut(name)?.burst_active = true;
        debug!(engine = name, "Burst enabled");
        Ok(())
    }

    pub fn disable_burst(&mut self, name: &str) -> Result<()> {
        self.entry_mut(name)?.burst_active = false;
        debug!(engine = name, "Burst disabled");
        Ok(())
    }

    /// Register a handler for not-exceeded → exceeded transitions.
    pub fn on_exceeded<F>(&mut self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(callback));
    }

    /// Clear one engine's spend and re-arm its exceedance callback.
    /// Headroom and the burst flag are left as they are.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        self.entry_mut(name)?.reset();
        debug!(engine = name, "Budget reset");
        Ok(())
    }

    /// Reset every engine and restore headroom to its initial value.
    pub fn reset_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.reset();
        }
        self.headroom = self.initial_headroom;
        info!(engines = self.entries.len(), "All budgets reset");
    }

    pub fn status(&self, name: &str) -> Result<BudgetStatus> {
        self.entry(name).map(|entry| status_of(name, entry))
    }

    pub fn remaining(&self, name: &str) -> Result<f64> {
        self.entry(name).map(LedgerEntry::remaining)
    }

    pub fn allocation(&self, name: &str) -> Result<f64> {
        self.entry(name).map(|entry| entry.allocation)
    }

    /// Status of every engine, in registration order.
    pub fn statuses(&self) -> Vec<BudgetStatus> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|e| status_of(name, e)))
            .collect()
    }

    fn entry(&self, name: &str) -> Result<&LedgerEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::UnknownEngine(name.to_string()))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut LedgerEntry> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| Error::UnknownEngine(name.to_string()))
    }
}

fn status_of(name: &str, entry: &LedgerEntry) -> BudgetStatus {
    BudgetStatus {
        engine_name: name.to_string(),
        allocation: entry.allocation,
        spent: entry.spent,
        remaining: entry.remaining(),
        exceeded: entry.is_exceeded(),
        burst_active: entry.burst_active,
    }
}
