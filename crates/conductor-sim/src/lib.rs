//! Simulation driver for the `conductor` binary.

pub mod sim;

pub use sim::{run, SimOptions, SimReport, DEFAULT_SLOT_COST, DEFAULT_TICKS};
