//! Budget ledger — converts scheduling weights into token allocations,
//! tracks spend, and manages the shared headroom pool.
//!
//! Limits are soft: spending never fails. Exceedance is reported through
//! [`BudgetStatus::exceeded`] and a one-shot callback per engine.

pub mod ledger;
pub mod types;

pub use ledger::{BudgetManager, ExceededCallback};
pub use types::BudgetStatus;
