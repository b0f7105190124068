//! Session and reward state machine for perk.
//!
//! A `Session` drives the five screens (logged-out, dashboard, ad watch,
//! withdrawal form, OTP entry) over a pluggable `ProfileStore` and
//! `AdDelivery` collaborator, publishing user-facing notifications to an
//! `EventBus`. See the submodules for the countdown timer, the ad-readiness
//! gate, the one-time-code challenge, and the withdrawal form handling.

mod ad;
mod error;
mod otp;
mod session;
mod timer;
mod withdraw;

pub use ad::{AdDelivery, AdError, AdGate, AdReadiness, SimulatedAdDelivery};
pub use error::SessionError;
pub use otp::generate_otp_code;
pub use session::{
    AdWatchOutcome, OtpDispatch, Screen, Session, SessionConfig, WatchAd, WithdrawalReceipt,
    WITHDRAWAL_THRESHOLD,
};
pub use timer::{CountdownEvent, CountdownHandle};
pub use withdraw::{mask_card_number, mask_cvv, mask_expiry, WithdrawalRequest};
