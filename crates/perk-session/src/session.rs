//! The session/reward state machine.
//!
//! One `Session` per signed-in user. The session exclusively owns the
//! in-memory profile; every operation takes `&mut self`, so profile
//! mutations are serialized, and each mutation is read-modify-persist
//! against the store before the in-memory copy is replaced.

use std::sync::Arc;
use std::time::Duration;

use perk_events::{EventBus, RewardEvent};
use perk_storage::{ProfileStore, SessionId, UserProfile};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::ad::{AdDelivery, AdGate, AdReadiness};
use crate::error::SessionError;
use crate::otp::{OtpChallenge, OtpCheck};
use crate::timer::{self, CountdownEvent, CountdownHandle};
use crate::withdraw::WithdrawalRequest;

/// Coins required before a withdrawal may be initiated.
pub const WITHDRAWAL_THRESHOLD: u64 = 100;

const MIN_PASSWORD_LEN: usize = 6;

/// The five screens the session branches over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    LoggedOut,
    Dashboard,
    Watching,
    WithdrawalForm,
    OtpPending,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Countdown length in seconds. Deployments have shipped 30 and 15.
    pub ad_duration_secs: u32,
    /// Wall-clock length of one countdown second. Tests shrink this.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ad_duration_secs: 30,
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Outcome of `watch_ad`.
pub enum WatchAd {
    /// Countdown running. Consume the events and call `complete_ad_watch`
    /// when `Completed` arrives.
    Started(mpsc::Receiver<CountdownEvent>),
    /// No ad staged; a load was requested. Watch again once the gate reports
    /// ready.
    LoadStarted,
}

/// Result of a completed ad watch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdWatchOutcome {
    pub balance: u64,
    pub ads_watched: u64,
    /// The new balance is a positive multiple of 100.
    pub checkpoint: bool,
}

/// Simulated dispatch of a one-time code. No SMS gateway is wired in, so the
/// code is handed back to the caller the way the original surfaced it on
/// screen.
#[derive(Clone, Debug)]
pub struct OtpDispatch {
    pub phone_number: String,
    pub code: String,
}

/// Receipt for a confirmed withdrawal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub amount: u64,
    pub card_last4: String,
}

pub struct Session {
    id: SessionId,
    store: Arc<dyn ProfileStore>,
    events: Arc<dyn EventBus>,
    ads: AdGate,
    config: SessionConfig,
    screen: Screen,
    profile: Option<UserProfile>,
    pending_withdrawal: Option<WithdrawalRequest>,
    challenge: Option<OtpChallenge>,
    countdown: Option<CountdownHandle>,
}

impl Session {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        events: Arc<dyn EventBus>,
        delivery: Arc<dyn AdDelivery>,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: SessionId::new(),
            store,
            events,
            ads: AdGate::new(delivery),
            config,
            screen: Screen::LoggedOut,
            profile: None,
            pending_withdrawal: None,
            challenge: None,
            countdown: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn ad_readiness(&self) -> AdReadiness {
        self.ads.readiness()
    }

    pub fn watch_ad_readiness(&self) -> watch::Receiver<AdReadiness> {
        self.ads.watch_readiness()
    }

    /// Sign in, creating a fresh zero-balance profile for a first-time email
    /// and loading the persisted one unchanged otherwise.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&UserProfile, SessionError> {
        if self.screen != Screen::LoggedOut {
            return Err(SessionError::WrongScreen(self.screen));
        }
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::Validation(
                "email and password are required".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let email = email.trim().to_lowercase();
        let profile = match self.store.load(&email).await? {
            Some(existing) => {
                info!(%email, coins = existing.coins, "persisted profile loaded");
                existing
            }
            None => {
                info!(%email, "fresh profile created");
                UserProfile::new(email)
            }
        };
        self.store.save(&profile).await?;
        self.screen = Screen::Dashboard;
        Ok(self.profile.insert(profile))
    }

    /// Resume a persisted profile without credentials (app relaunch).
    /// Returns false, staying logged out, when nothing is stored.
    pub async fn restore(&mut self, email: &str) -> Result<bool, SessionError> {
        if self.screen != Screen::LoggedOut {
            return Err(SessionError::WrongScreen(self.screen));
        }
        let email = email.trim().to_lowercase();
        match self.store.load(&email).await? {
            Some(profile) => {
                info!(%email, "session restored");
                self.profile = Some(profile);
                self.screen = Screen::Dashboard;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sign out: abort any running countdown (no credit), drop the challenge
    /// and form buffer, and clear the persisted slot entirely.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        let profile = self.profile.take().ok_or(SessionError::NotLoggedIn)?;
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
            debug!("countdown aborted by logout");
        }
        self.challenge = None;
        self.pending_withdrawal = None;
        self.ads.reset();
        self.store.clear(&profile.email).await?;
        self.screen = Screen::LoggedOut;
        info!(email = %profile.email, "signed out; persisted slot cleared");
        Ok(())
    }

    /// Dashboard → withdrawal form.
    pub fn open_withdrawal(&mut self) -> Result<(), SessionError> {
        if self.profile.is_none() {
            return Err(SessionError::NotLoggedIn);
        }
        if self.screen != Screen::Dashboard {
            return Err(SessionError::WrongScreen(self.screen));
        }
        self.screen = Screen::WithdrawalForm;
        Ok(())
    }

    /// Withdrawal form → dashboard.
    pub fn cancel_withdrawal(&mut self) -> Result<(), SessionError> {
        if self.screen != Screen::WithdrawalForm {
            return Err(SessionError::WrongScreen(self.screen));
        }
        self.pending_withdrawal = None;
        self.screen = Screen::Dashboard;
        Ok(())
    }

    /// OTP entry → back to the form. The challenge is discarded; resubmitting
    /// issues a fresh code.
    pub fn cancel_otp(&mut self) -> Result<(), SessionError> {
        if self.screen != Screen::OtpPending {
            return Err(SessionError::WrongScreen(self.screen));
        }
        self.challenge = None;
        self.screen = Screen::WithdrawalForm;
        Ok(())
    }

    /// Elect to watch an advertisement.
    ///
    /// With an ad staged, consumes the readiness, notifies the collaborator,
    /// and starts the countdown. Otherwise requests one load; a request while
    /// a load is in flight is rejected without double-triggering, and a
    /// recorded load failure surfaces here once.
    pub fn watch_ad(&mut self) -> Result<WatchAd, SessionError> {
        if self.profile.is_none() {
            return Err(SessionError::NotLoggedIn);
        }
        if self.screen != Screen::Dashboard {
            return Err(SessionError::WrongScreen(self.screen));
        }

        if let Some(reason) = self.ads.take_failure() {
            return Err(SessionError::AdLoad(reason));
        }

        if self.ads.take_ready() {
            self.ads.notify_started();
            let (handle, events) =
                timer::start(self.config.ad_duration_secs, self.config.tick_interval);
            self.countdown = Some(handle);
            self.screen = Screen::Watching;
            debug!(secs = self.config.ad_duration_secs, "countdown started");
            return Ok(WatchAd::Started(events));
        }

        if self.ads.begin_load() {
            debug!("ad load requested");
            Ok(WatchAd::LoadStarted)
        } else {
            Err(SessionError::AdLoadInFlight)
        }
    }

    /// Apply the reward for a countdown that reached zero.
    ///
    /// Credits exactly one coin and one ad in the same mutation, persists,
    /// resets ad readiness, and raises the checkpoint notification when the
    /// new balance is a positive multiple of 100. A stale completion after
    /// logout or teardown is rejected: the session is no longer Watching.
    pub async fn complete_ad_watch(&mut self) -> Result<AdWatchOutcome, SessionError> {
        if self.screen != Screen::Watching {
            return Err(SessionError::WrongScreen(self.screen));
        }
        self.countdown = None;

        let mut updated = self
            .profile
            .as_ref()
            .ok_or(SessionError::NotLoggedIn)?
            .clone();
        let balance = updated.credit_ad_watch();
        let ads_watched = updated.ads_watched;
        self.store.save(&updated).await?;
        self.profile = Some(updated);

        self.ads.notify_completed();
        self.ads.reset();
        self.screen = Screen::Dashboard;

        let checkpoint = balance % 100 == 0;
        if checkpoint {
            if let Err(e) = self
                .events
                .publish(&self.id, RewardEvent::CheckpointReached { balance })
                .await
            {
                warn!("checkpoint notification dropped: {}", e);
            }
        }
        info!(balance, ads_watched, "ad watch credited");
        Ok(AdWatchOutcome {
            balance,
            ads_watched,
            checkpoint,
        })
    }

    /// Submit the withdrawal form. Balance is checked before field presence,
    /// and on success a one-time code is issued and held only in memory.
    pub fn request_withdrawal(
        &mut self,
        form: WithdrawalRequest,
    ) -> Result<OtpDispatch, SessionError> {
        if self.screen != Screen::WithdrawalForm {
            return Err(SessionError::WrongScreen(self.screen));
        }
        let profile = self.profile.as_ref().ok_or(SessionError::NotLoggedIn)?;
        if profile.coins < WITHDRAWAL_THRESHOLD {
            return Err(SessionError::InsufficientBalance {
                have: profile.coins,
                need: WITHDRAWAL_THRESHOLD,
            });
        }

        let form = form.normalized();
        form.validate()?;

        let challenge = OtpChallenge::issue(&form.phone_number);
        let dispatch = OtpDispatch {
            phone_number: challenge.phone_number().to_string(),
            code: challenge.code().to_string(),
        };
        self.pending_withdrawal = Some(form);
        self.challenge = Some(challenge);
        self.screen = Screen::OtpPending;
        info!(to = %dispatch.phone_number, "one-time code issued");
        Ok(dispatch)
    }

    /// Confirm the pending withdrawal with the one-time code.
    ///
    /// On an exact match the balance drains to zero, `has_withdrawn` is set,
    /// and the profile persists, all before the in-memory state advances.
    /// Confirming again after success finds no active challenge, so a coin
    /// can never be debited twice.
    pub async fn confirm_otp(&mut self, input: &str) -> Result<WithdrawalReceipt, SessionError> {
        let Some(challenge) = self.challenge.as_mut() else {
            return Err(SessionError::NoActiveChallenge);
        };

        match challenge.check(input) {
            OtpCheck::Expired => {
                self.challenge = None;
                self.screen = Screen::WithdrawalForm;
                Err(SessionError::OtpExpired)
            }
            OtpCheck::Exhausted => {
                self.challenge = None;
                self.screen = Screen::WithdrawalForm;
                warn!("one-time code attempts exhausted");
                Err(SessionError::OtpAttemptsExhausted)
            }
            OtpCheck::Mismatch { attempts_remaining } => {
                Err(SessionError::InvalidOtp { attempts_remaining })
            }
            OtpCheck::Match => {
                let form = self
                    .pending_withdrawal
                    .as_ref()
                    .ok_or(SessionError::NoActiveChallenge)?;
                let card_last4 = form.card_last4();
                let phone_number = form.phone_number.clone();

                let mut updated = self
                    .profile
                    .as_ref()
                    .ok_or(SessionError::NotLoggedIn)?
                    .clone();
                updated.phone_number = Some(phone_number);
                let amount = updated.drain_for_withdrawal();
                self.store.save(&updated).await?;
                self.profile = Some(updated);

                self.pending_withdrawal = None;
                self.challenge = None;
                self.screen = Screen::Dashboard;

                if let Err(e) = self
                    .events
                    .publish(
                        &self.id,
                        RewardEvent::WithdrawalCompleted {
                            amount,
                            card_last4: card_last4.clone(),
                        },
                    )
                    .await
                {
                    warn!("withdrawal notification dropped: {}", e);
                }
                info!(amount, "withdrawal confirmed");
                Ok(WithdrawalReceipt { amount, card_last4 })
            }
        }
    }
}
