//! Bounded FIFO mailbox owned by one engine.

use std::collections::VecDeque;

use conductor_core::{Error, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::message::Message;

/// Counters over a port's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PortMetrics {
    pub accepted: u64,
    pub rejected: u64,
    pub drained: u64,
}

#[derive(Debug)]
pub struct Port {
    name: String,
    capacity: usize,
    queue: VecDeque<Message>,
    metrics: PortMetrics,
}

impl Port {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            queue: VecDeque::new(),
            metrics: PortMetrics::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages waiting to be drained.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    pub fn metrics(&self) -> PortMetrics {
        self.metrics
    }

    /// Append to the tail, or fail with `MailboxFull` when at capacity.
    pub fn enqueue(&mut self, message: Message) -> Result<()> {
        if self.is_full() {
            self.metrics.rejected += 1;
            warn!(
                port = %self.name,
                capacity = self.capacity,
                message = %message.id,
                "Port full, message rejected"
            );
            return Err(Error::MailboxFull {
                port: self.name.clone(),
                capacity: self.capacity,
            });
        }

        self.queue.push_back(message);
        self.metrics.accepted += 1;
        Ok(())
    }

    /// Remove and return every pending message, oldest first.
    pub fn drain(&mut self) -> Vec<Message> {
        let messages: Vec<Message> = self.queue.drain(..).collect();
        self.metrics.drained += messages.len() as u64;
        if !messages.is_empty() {
            debug!(port = %self.name, count = messages.len(), "Port drained");
        }
        messages
    }
}
