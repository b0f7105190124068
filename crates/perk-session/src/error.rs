//! Session error kinds.
//!
//! Every variant is recoverable in place: the state machine stays on the
//! current screen (or steps back to the form) and the user retries.

use perk_storage::StoreError;
use thiserror::Error;

use crate::session::Screen;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient balance: have {have} coins, need {need}")]
    InsufficientBalance { have: u64, need: u64 },

    #[error("invalid one-time code ({attempts_remaining} attempts remaining)")]
    InvalidOtp { attempts_remaining: i32 },

    #[error("one-time code expired; submit the withdrawal again for a new code")]
    OtpExpired,

    #[error("too many failed attempts; submit the withdrawal again for a new code")]
    OtpAttemptsExhausted,

    #[error("no withdrawal confirmation pending")]
    NoActiveChallenge,

    #[error("ad delivery: {0}")]
    AdLoad(String),

    #[error("an ad load is already in progress")]
    AdLoadInFlight,

    #[error("not signed in")]
    NotLoggedIn,

    #[error("not available on the {0:?} screen")]
    WrongScreen(Screen),

    #[error(transparent)]
    Store(#[from] StoreError),
}
