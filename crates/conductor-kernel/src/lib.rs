//! Kernel — lifecycle, tick cycle, message routing and budget pass-through
//! for a closed set of engines.
//!
//! The kernel is synchronous: every call completes before returning. For use
//! from several threads, wrap it in a [`SharedKernel`].

pub mod kernel;
pub mod shared;
pub mod types;

pub use kernel::Kernel;
pub use shared::SharedKernel;
pub use types::*;

pub use conductor_budget::BudgetStatus;
pub use conductor_core::{EngineDescriptor, EngineRegistry, KernelConfig, LifecycleState};
pub use conductor_port::{Message, MessagePriority, PortMetrics};
