//! End-to-end reward flow: earn to the checkpoint, then withdraw.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use perk_events::{EventBus, RewardEvent};
use perk_events_memory::MemoryEventBus;
use perk_session::{
    AdDelivery, AdError, AdReadiness, CountdownEvent, Screen, Session, SessionConfig, WatchAd,
    WithdrawalRequest,
};
use perk_storage::ProfileStore;
use perk_store_memory::MemoryStore;

struct InstantAds;

#[async_trait]
impl AdDelivery for InstantAds {
    async fn request_load(&self) -> Result<(), AdError> {
        Ok(())
    }
    fn notify_started(&self) {}
    fn notify_completed(&self) {}
}

async fn watch_to_completion(session: &mut Session) -> u64 {
    loop {
        match session.watch_ad().unwrap() {
            WatchAd::Started(mut events) => {
                while let Some(ev) = events.recv().await {
                    if ev == CountdownEvent::Completed {
                        return session.complete_ad_watch().await.unwrap().balance;
                    }
                }
                panic!("countdown ended without completion");
            }
            WatchAd::LoadStarted => {
                let mut rx = session.watch_ad_readiness();
                rx.wait_for(|s| *s == AdReadiness::Ready).await.unwrap();
            }
        }
    }
}

#[tokio::test]
async fn earn_one_hundred_coins_and_withdraw() {
    let store = Arc::new(MemoryStore::new());
    let events = Arc::new(MemoryEventBus::new());
    let mut session = Session::new(
        store.clone(),
        events.clone(),
        Arc::new(InstantAds),
        SessionConfig {
            ad_duration_secs: 1,
            tick_interval: Duration::from_millis(1),
        },
    );

    session.login("a@b.com", "secret1").await.unwrap();

    let mut notifications = events.subscribe(&session.id()).await.unwrap();

    // First watch: coins=1, adsWatched=1.
    assert_eq!(watch_to_completion(&mut session).await, 1);
    {
        let profile = session.profile().unwrap();
        assert_eq!(profile.coins, 1);
        assert_eq!(profile.ads_watched, 1);
    }

    // 99 more cycles reach the checkpoint.
    for _ in 0..99 {
        watch_to_completion(&mut session).await;
    }
    {
        let profile = session.profile().unwrap();
        assert_eq!(profile.coins, 100);
        assert_eq!(profile.ads_watched, 100);
    }

    let event = tokio::time::timeout(Duration::from_secs(1), notifications.next())
        .await
        .expect("timeout")
        .expect("stream ended");
    assert_eq!(event, RewardEvent::CheckpointReached { balance: 100 });

    // Withdraw via the issued code.
    session.open_withdrawal().unwrap();
    let dispatch = session
        .request_withdrawal(WithdrawalRequest {
            email: "a@b.com".to_string(),
            card_number: "1234 5678 9012 3456".to_string(),
            expiry: "12/28".to_string(),
            cvv: "123".to_string(),
            cardholder_name: "Ada Lovelace".to_string(),
            phone_number: "+1 234 567 8900".to_string(),
        })
        .unwrap();
    assert_eq!(session.screen(), Screen::OtpPending);
    assert_eq!(dispatch.code.len(), 6);

    let receipt = session.confirm_otp(&dispatch.code).await.unwrap();
    assert_eq!(receipt.amount, 100);
    assert_eq!(session.screen(), Screen::Dashboard);

    let profile = session.profile().unwrap();
    assert_eq!(profile.coins, 0);
    assert_eq!(profile.ads_watched, 100);
    assert!(profile.has_withdrawn);

    // The drained balance is what the store remembers.
    let persisted = store.load("a@b.com").await.unwrap().unwrap();
    assert_eq!(persisted.coins, 0);
    assert!(persisted.has_withdrawn);

    let event = tokio::time::timeout(Duration::from_secs(1), notifications.next())
        .await
        .expect("timeout")
        .expect("stream ended");
    assert_eq!(
        event,
        RewardEvent::WithdrawalCompleted {
            amount: 100,
            card_last4: "3456".to_string(),
        }
    );

    // Earning continues from zero while the lifetime counter keeps growing.
    assert_eq!(watch_to_completion(&mut session).await, 1);
    assert_eq!(session.profile().unwrap().ads_watched, 101);
}
