//! Conductor Core — error type, configuration, engine registry boundary.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod registry;

pub use config::KernelConfig;
pub use error::{Error, Result};
pub use lifecycle::LifecycleState;
pub use registry::{EngineDescriptor, EngineRegistry, StaticRegistry};
