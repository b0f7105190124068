//! In-memory profile store.
//!
//! Suitable for tests and ephemeral runs; nothing survives the process.
//! For durable client-side persistence use perk-store-file instead.

use async_trait::async_trait;
use dashmap::DashMap;
use perk_storage::{ProfileStore, StoreError, UserProfile};

/// Profile store backed by a concurrent map keyed by email.
///
/// Each `save` replaces the whole record for that email (last-write-wins),
/// matching the durable backends.
#[derive(Default)]
pub struct MemoryStore {
    profiles: DashMap<String, UserProfile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn load(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.get(email).map(|p| p.clone()))
    }

    async fn save(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.profiles
            .insert(profile.email.clone(), profile.clone());
        Ok(())
    }

    async fn clear(&self, email: &str) -> Result<(), StoreError> {
        self.profiles.remove(email);
        Ok(())
    }
}
