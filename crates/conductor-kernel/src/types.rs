//! Kernel types.

use conductor_budget::BudgetStatus;
use conductor_core::LifecycleState;
use serde::Serialize;

/// Outcome of one tick: who runs this round, and the tick number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    pub scheduled: Vec<String>,
    #[serde(rename = "tickCount")]
    pub tick_count: u64,
}

/// Read-only view of the whole kernel.
#[derive(Debug, Clone, Serialize)]
pub struct KernelSnapshot {
    pub state: LifecycleState,
    #[serde(rename = "tickCount")]
    pub tick_count: u64,
    /// Shared headroom pool; negative when oversubscribed.
    pub headroom: f64,
    pub engines: Vec<BudgetStatus>,
}

impl KernelSnapshot {
    pub fn engine(&self, name: &str) -> Option<&BudgetStatus> {
        self.engines.iter().find(|e| e.engine_name == name)
    }

    /// Names of engines currently over budget.
    pub fn exceeded(&self) -> Vec<&str> {
        self.engines
            .iter()
            .filter(|e| e.exceeded)
            .map(|e| e.engine_name.as_str())
            .collect()
    }
}
