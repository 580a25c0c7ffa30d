//! Ports — bounded, ordered inboxes for engine-to-engine messages.
//!
//! A full port rejects new messages with [`conductor_core::Error::MailboxFull`]
//! instead of dropping anything, leaving the reaction to the sender.

pub mod message;
pub mod port;

pub use message::{Message, MessagePriority};
pub use port::{Port, PortMetrics};
