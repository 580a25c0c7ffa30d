//! Budget types.

use serde::{Deserialize, Serialize};

/// Point-in-time view of one engine's budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    #[serde(rename = "engineName")]
    pub engine_name: String,
    /// Tokens granted to the engine out of the non-headroom budget.
    pub allocation: f64,
    /// Cumulative tokens charged since the last reset.
    pub spent: u64,
    /// `allocation - spent`; negative once the engine overspends.
    pub remaining: f64,
    /// Overspend not backed by headroom.
    pub exceeded: bool,
    #[serde(rename = "burstActive")]
    pub burst_active: bool,
}

impl BudgetStatus {
    /// Fraction of the allocation consumed. `0.0` for a zero allocation with
    /// nothing spent, infinite for a zero allocation with spend.
    pub fn utilization(&self) -> f64 {
        let spent = self.spent as f64;
        if self.allocation > 0.0 {
            spent / self.allocation
        } else if spent > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}
