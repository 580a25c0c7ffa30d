//! Scheduler — decides which awake engines run in a round, and in what order.

pub mod scheduler;

pub use scheduler::{apportion, Scheduler};
