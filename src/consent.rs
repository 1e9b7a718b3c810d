//! Persisted privacy-notice consent
//!
//! [`LocalStorage`] mirrors the browser's string key/value store, kept as a
//! single JSON object on disk. A missing file is an empty store.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PRIVACY_ACCEPTED_KEY: &str = "privacyAccepted";
pub const DEFAULT_STORAGE_PATH: &str = ".visitor-beacon/local-storage.json";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.read_all().await?;
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&items)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!(key, path = %self.path.display(), "Stored local item");
        Ok(())
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }
}

/// The `privacyAccepted` flag that suppresses the privacy notice
#[derive(Debug, Clone)]
pub struct ConsentStore {
    storage: LocalStorage,
}

impl ConsentStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub async fn accept_privacy(&self) -> Result<()> {
        self.storage.set_item(PRIVACY_ACCEPTED_KEY, "true").await
    }

    /// Any non-empty stored value counts as accepted.
    pub async fn privacy_accepted(&self) -> Result<bool> {
        Ok(self
            .storage
            .get_item(PRIVACY_ACCEPTED_KEY)
            .await?
            .is_some_and(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fresh_store_is_not_accepted() {
        let dir = TempDir::new().unwrap();
        let store = ConsentStore::new(LocalStorage::new(dir.path().join("ls.json")));
        assert!(!store.privacy_accepted().await.unwrap());
    }

    #[tokio::test]
    async fn test_accept_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ls.json");

        ConsentStore::new(LocalStorage::new(&path))
            .accept_privacy()
            .await
            .unwrap();

        let reopened = ConsentStore::new(LocalStorage::new(&path));
        assert!(reopened.privacy_accepted().await.unwrap());
        assert_eq!(
            reopened.storage().get_item(PRIVACY_ACCEPTED_KEY).await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_set_item_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("ls.json"));
        storage.set_item("theme", "dark").await.unwrap();
        storage.set_item(PRIVACY_ACCEPTED_KEY, "true").await.unwrap();

        assert_eq!(storage.get_item("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_empty_value_is_not_accepted() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("ls.json"));
        storage.set_item(PRIVACY_ACCEPTED_KEY, "").await.unwrap();

        assert!(!ConsentStore::new(storage).privacy_accepted().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ls.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(LocalStorage::new(&path).get_item(PRIVACY_ACCEPTED_KEY).await.is_err());
    }
}
