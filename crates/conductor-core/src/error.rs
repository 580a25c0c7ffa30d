//! Error types for the conductor kernel.

use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Structural misuse of the kernel and its components.
///
/// Budget exceedance is deliberately absent: it is reported through
/// status snapshots and callbacks, never as an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("Duplicate engine: {0}")]
    DuplicateEngine(String),

    #[error("Invalid transition: cannot {operation} while {state}")]
    InvalidTransition {
        state: LifecycleState,
        operation: &'static str,
    },

    #[error("Mailbox full: port={port}, capacity={capacity}")]
    MailboxFull { port: String, capacity: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
