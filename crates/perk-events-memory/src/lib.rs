//! In-memory event bus implementation using tokio broadcast channels.
//!
//! Events are only broadcast within a single process, which matches the
//! one-session-per-user client model. A multi-replica deployment would need
//! a shared-backend implementation of the same trait.

use async_trait::async_trait;
use dashmap::DashMap;
use perk_events::{EventBus, EventBusError, EventStream, RewardEvent};
use perk_storage::SessionId;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const CHANNEL_CAPACITY: usize = 32;

/// In-memory event bus using one broadcast channel per session.
///
/// Subscribers that fall behind drop events (notifications are
/// fire-and-forget, so lagging is not an error).
#[derive(Default)]
pub struct MemoryEventBus {
    channels: DashMap<SessionId, broadcast::Sender<RewardEvent>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, session: &SessionId) -> broadcast::Sender<RewardEvent> {
        self.channels
            .entry(*session)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, session: &SessionId, event: RewardEvent) -> Result<(), EventBusError> {
        // Ignore error if no receivers (this is fine)
        let _ = self.channel(session).send(event);
        Ok(())
    }

    async fn subscribe(&self, session: &SessionId) -> Result<EventStream, EventBusError> {
        let rx = self.channel(session).subscribe();
        // Filter out lagged errors; a client that fell behind just misses
        // the dropped notifications.
        let stream = BroadcastStream::new(rx).filter_map(|result| result.ok());
        Ok(Box::pin(stream))
    }
}
