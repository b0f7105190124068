//! JSON-file profile store.
//!
//! One JSON document of profiles keyed by email, rewritten on every save.
//! This is the client-side local-storage analog: durable across restarts on
//! the same machine, last-write-wins, no independent lifecycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use perk_storage::{ProfileStore, StoreError, UserProfile};
use tokio::sync::Mutex;

/// Profile store persisted as a single JSON file.
///
/// The whole document is re-read and rewritten under one lock per mutation,
/// so each save/clear is its own read-modify-write critical section.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// `~/.perk/profiles.json` (creates dir with 0700 perms on unix).
    pub fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".perk");
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(Self::open(dir.join("profiles.json")))
    }

    /// Open a store at a custom path. The file is created on first save.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, UserProfile>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(StoreError::Backend(e.to_string())),
        };
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn write_all(&self, profiles: &HashMap<String, UserProfile>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(profiles)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl ProfileStore for FileStore {
    async fn load(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all()?.remove(email))
    }

    async fn save(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut profiles = self.read_all()?;
        profiles.insert(profile.email.clone(), profile.clone());
        self.write_all(&profiles)
    }

    async fn clear(&self, email: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut profiles = self.read_all()?;
        if profiles.remove(email).is_some() {
            self.write_all(&profiles)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("profiles.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn load_before_first_save_is_none() {
        let (_dir, store) = temp_store();
        assert!(store.load("a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profiles_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        let store = FileStore::open(&path);
        let mut profile = UserProfile::new("a@b.com");
        profile.credit_ad_watch();
        store.save(&profile).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path);
        let loaded = reopened.load("a@b.com").await.unwrap().unwrap();
        assert_eq!(loaded, profile);
    }

    #[tokio::test]
    async fn clear_removes_the_record() {
        let (_dir, store) = temp_store();
        store.save(&UserProfile::new("a@b.com")).await.unwrap();
        store.save(&UserProfile::new("c@d.com")).await.unwrap();

        store.clear("a@b.com").await.unwrap();
        assert!(store.load("a@b.com").await.unwrap().is_none());
        assert!(store.load("c@d.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_on_missing_file_is_ok() {
        let (_dir, store) = temp_store();
        store.clear("a@b.com").await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_reports_corrupt() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "{not json").unwrap();

        match store.load("a@b.com").await {
            Err(StoreError::Corrupt(_)) => {}
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }
}
