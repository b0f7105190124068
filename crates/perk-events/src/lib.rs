//! Event bus abstraction for perk reward notifications.
//!
//! This crate defines the EventBus trait that allows different implementations
//! for notification delivery:
//! - Memory (single process, tokio broadcast channels)
//! - anything fancier a multi-replica deployment might need
//!
//! Events are presentational (celebratory banners, receipts) and
//! fire-and-forget: core correctness never depends on delivery.

use async_trait::async_trait;
use futures::Stream;
use perk_storage::SessionId;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

/// A user-facing notification raised by the session core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardEvent {
    /// Balance crossed a positive multiple of 100 coins.
    CheckpointReached { balance: u64 },
    /// A withdrawal was confirmed and the balance drained.
    WithdrawalCompleted { amount: u64, card_last4: String },
}

/// Error type for event bus operations
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Stream of reward events for one session.
pub type EventStream = Pin<Box<dyn Stream<Item = RewardEvent> + Send>>;

/// Event bus trait for publishing and subscribing to reward notifications.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to all subscribers of this session.
    ///
    /// Publishing with no subscribers succeeds; the event is simply dropped.
    async fn publish(&self, session: &SessionId, event: RewardEvent) -> Result<(), EventBusError>;

    /// Subscribe to events for a session.
    ///
    /// Returns a stream that yields events as they occur, until dropped.
    async fn subscribe(&self, session: &SessionId) -> Result<EventStream, EventBusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_event_equality() {
        assert_eq!(
            RewardEvent::CheckpointReached { balance: 100 },
            RewardEvent::CheckpointReached { balance: 100 }
        );
        assert_ne!(
            RewardEvent::CheckpointReached { balance: 100 },
            RewardEvent::CheckpointReached { balance: 200 }
        );
    }

    #[test]
    fn reward_event_serialization() {
        let event = RewardEvent::WithdrawalCompleted {
            amount: 100,
            card_last4: "3456".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: RewardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn event_bus_error_display() {
        let error = EventBusError::Backend("channel closed".to_string());
        assert!(error.to_string().contains("backend error"));
        assert!(error.to_string().contains("channel closed"));
    }
}
