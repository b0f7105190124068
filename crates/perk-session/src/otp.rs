//! One-time code generation and verification.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use subtle::ConstantTimeEq;

/// Maximum verification attempts per code.
const MAX_ATTEMPTS: i32 = 5;

/// Codes expire this many minutes after issue.
const CODE_TTL_MINUTES: i64 = 10;

/// Generate a cryptographically secure 6-digit one-time code.
///
/// Returns a string of exactly 6 digits (000000-999999).
pub fn generate_otp_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(0..1_000_000);
    format!("{:06}", code)
}

/// An issued withdrawal-confirmation challenge. Session-scoped: held only in
/// memory, discarded on success, expiry, exhaustion, or logout.
#[derive(Clone, Debug)]
pub(crate) struct OtpChallenge {
    code: String,
    phone_number: String,
    expires_at: DateTime<Utc>,
    attempts: i32,
}

/// Result of checking user input against a challenge.
pub(crate) enum OtpCheck {
    Match,
    Mismatch { attempts_remaining: i32 },
    Expired,
    Exhausted,
}

impl OtpChallenge {
    pub(crate) fn issue(phone_number: &str) -> Self {
        Self {
            code: generate_otp_code(),
            phone_number: phone_number.to_string(),
            expires_at: Utc::now() + Duration::minutes(CODE_TTL_MINUTES),
            attempts: 0,
        }
    }

    pub(crate) fn code(&self) -> &str {
        &self.code
    }

    pub(crate) fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// Check `input` against the code. Comparison is exact and constant-time;
    /// an all-zero code matches all-zero input like any other value.
    pub(crate) fn check(&mut self, input: &str) -> OtpCheck {
        if Utc::now() > self.expires_at {
            return OtpCheck::Expired;
        }

        let matches: bool = input.as_bytes().ct_eq(self.code.as_bytes()).into();
        if matches {
            return OtpCheck::Match;
        }

        self.attempts += 1;
        if self.attempts >= MAX_ATTEMPTS {
            OtpCheck::Exhausted
        } else {
            OtpCheck::Mismatch {
                attempts_remaining: MAX_ATTEMPTS - self.attempts,
            }
        }
    }
}
