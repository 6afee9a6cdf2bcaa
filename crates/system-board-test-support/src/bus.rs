//! Test buses: `MessageBus` implementations that record or reject sends.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use system_board_core::bus::{BusMessage, MessageBus};
use system_board_core::error::DomainError;

/// A bus that acknowledges every message and keeps it, except for messages
/// registered with [`RecordingMessageBus::reject_key`] or
/// [`RecordingMessageBus::reject_id`].
#[derive(Debug, Default)]
pub struct RecordingMessageBus {
    sent: Mutex<Vec<BusMessage>>,
    rejected_keys: Mutex<HashSet<String>>,
    rejected_ids: Mutex<HashSet<String>>,
}

impl RecordingMessageBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later send with this message key fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn reject_key(&self, key: impl Into<String>) {
        self.rejected_keys.lock().unwrap().insert(key.into());
    }

    /// Makes every later send of the message with this id fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn reject_id(&self, id: impl Into<String>) {
        self.rejected_ids.lock().unwrap().insert(id.into());
    }

    /// Returns a snapshot of all acknowledged messages, in send order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<BusMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageBus for RecordingMessageBus {
    async fn send(&self, message: BusMessage) -> Result<(), DomainError> {
        if self.rejected_keys.lock().unwrap().contains(&message.key)
            || self.rejected_ids.lock().unwrap().contains(&message.id)
        {
            return Err(DomainError::Transport(format!(
                "broker did not acknowledge message {} for key {}",
                message.id, message.key
            )));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// A bus whose broker is always unreachable.
#[derive(Debug)]
pub struct FailingMessageBus;

#[async_trait]
impl MessageBus for FailingMessageBus {
    async fn send(&self, _message: BusMessage) -> Result<(), DomainError> {
        Err(DomainError::Transport("broker unreachable".into()))
    }
}
