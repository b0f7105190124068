//! Ad delivery collaborator and readiness gate.
//!
//! The core never sees ad content; it only needs the ready/error signal
//! before a countdown may start, and tells the collaborator when playback
//! starts and completes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AdError {
    #[error("ad delivery failed: {0}")]
    Delivery(String),
}

/// External ad-delivery collaborator.
#[async_trait]
pub trait AdDelivery: Send + Sync {
    /// Stage an ad. Resolves once the collaborator reports ready (or fails).
    async fn request_load(&self) -> Result<(), AdError>;

    /// The staged ad started playing.
    fn notify_started(&self);

    /// The staged ad played to completion.
    fn notify_completed(&self);
}

/// Readiness of the ad slot as observed by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdReadiness {
    NotReady,
    Loading,
    Ready,
    Failed(String),
}

/// Gate in front of the collaborator: at most one load in flight, readiness
/// consumed per watch and reset after completion.
pub struct AdGate {
    state: Arc<watch::Sender<AdReadiness>>,
    delivery: Arc<dyn AdDelivery>,
}

impl AdGate {
    pub fn new(delivery: Arc<dyn AdDelivery>) -> Self {
        let (state, _) = watch::channel(AdReadiness::NotReady);
        Self {
            state: Arc::new(state),
            delivery,
        }
    }

    pub fn readiness(&self) -> AdReadiness {
        self.state.borrow().clone()
    }

    /// Observe readiness transitions (UIs watch this to flip the button label).
    pub fn watch_readiness(&self) -> watch::Receiver<AdReadiness> {
        self.state.subscribe()
    }

    /// Kick off one load. Returns false, without re-triggering, when a load
    /// is already in flight or an ad is already staged.
    pub(crate) fn begin_load(&self) -> bool {
        {
            let current = self.state.borrow();
            if matches!(*current, AdReadiness::Loading | AdReadiness::Ready) {
                return false;
            }
        }
        self.state.send_replace(AdReadiness::Loading);

        let state = Arc::clone(&self.state);
        let delivery = Arc::clone(&self.delivery);
        tokio::spawn(async move {
            let next = match delivery.request_load().await {
                Ok(()) => AdReadiness::Ready,
                Err(e) => AdReadiness::Failed(e.to_string()),
            };
            debug!(?next, "ad load settled");
            state.send_replace(next);
        });
        true
    }

    /// Consume a staged ad. Readiness drops back to NotReady so the next
    /// watch forces a fresh load.
    pub(crate) fn take_ready(&self) -> bool {
        let mut took = false;
        self.state.send_if_modified(|s| {
            if *s == AdReadiness::Ready {
                *s = AdReadiness::NotReady;
                took = true;
                true
            } else {
                false
            }
        });
        took
    }

    /// Consume a recorded load failure, if any.
    pub(crate) fn take_failure(&self) -> Option<String> {
        let mut reason = None;
        self.state.send_if_modified(|s| {
            if let AdReadiness::Failed(r) = s {
                reason = Some(r.clone());
                *s = AdReadiness::NotReady;
                true
            } else {
                false
            }
        });
        reason
    }

    pub(crate) fn reset(&self) {
        self.state.send_replace(AdReadiness::NotReady);
    }

    pub(crate) fn notify_started(&self) {
        self.delivery.notify_started();
    }

    pub(crate) fn notify_completed(&self) {
        self.delivery.notify_completed();
    }
}

/// Stand-in for a real rewarded-ad network: waits a configured latency, then
/// reports ready.
pub struct SimulatedAdDelivery {
    latency: Duration,
}

impl SimulatedAdDelivery {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl AdDelivery for SimulatedAdDelivery {
    async fn request_load(&self) -> Result<(), AdError> {
        tokio::time::sleep(self.latency).await;
        Ok(())
    }

    fn notify_started(&self) {
        debug!("simulated ad started");
    }

    fn notify_completed(&self) {
        debug!("simulated ad completed");
    }
}
