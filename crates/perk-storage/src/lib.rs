//! Storage abstraction for perk.
//!
//! Backend crates (perk-store-memory, perk-store-file) implement this trait so
//! the session core doesn't depend on any specific persistence mechanism.

mod types;

use thiserror::Error;

pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("corrupt profile data: {0}")]
    Corrupt(String),
}

/// The persistence trait the session core depends on.
///
/// Profiles are keyed by (lowercased) email. Semantics are last-write-wins:
/// `save` overwrites the stored record for that email, `clear` removes it
/// entirely. Absence is an ordinary outcome, not an error.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the stored profile for an email, if any.
    async fn load(&self, email: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Overwrite the stored profile for `profile.email`.
    async fn save(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Remove the stored profile for an email. Removing an absent profile is ok.
    async fn clear(&self, email: &str) -> Result<(), StoreError>;
}
