use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::{GlmrError, Result};

/// Last time the operator looked at each merge request, keyed by merge request GID.
pub type LastSeenTimes = HashMap<String, DateTime<Utc>>;

/// Local key-value state: the operator's username and per-MR last-seen times.
///
/// Listing code only reads from the store. Writes happen when the operator
/// acts on a merge request (or logs in).
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn last_seen_times(&self) -> Result<LastSeenTimes>;
    async fn my_username(&self) -> Result<Option<String>>;
    async fn mark_seen(&self, mr_id: &str, at: DateTime<Utc>) -> Result<()>;
    async fn set_my_username(&self, username: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PersistedState {
    #[serde(default)]
    my_username: Option<String>,
    #[serde(default)]
    last_seen: LastSeenTimes,
}

/// State persisted as JSON in the platform data directory:
/// - Linux: `~/.local/share/glmr/state.json`
/// - macOS: `~/Library/Application Support/glmr/state.json`
pub struct FileStateStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: RwLock::new(()),
        }
    }

    /// Opens the store at the default platform location.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no data directory.
    pub fn open_default() -> Result<Self> {
        let path = dirs::data_dir()
            .ok_or_else(|| GlmrError::Storage("No data directory found".into()))?
            .join("glmr")
            .join("state.json");

        debug!("Using state file: {}", path.display());
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is empty state; a corrupt one is an error and is left untouched.
    async fn read(&self) -> Result<PersistedState> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PersistedState::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            GlmrError::Storage(format!(
                "Failed to parse state file {}: {e}",
                self.path.display()
            ))
        })
    }

    async fn write(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(state)?).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn last_seen_times(&self) -> Result<LastSeenTimes> {
        let _guard = self.lock.read().await;
        Ok(self.read().await?.last_seen)
    }

    async fn my_username(&self) -> Result<Option<String>> {
        let _guard = self.lock.read().await;
        Ok(self.read().await?.my_username)
    }

    async fn mark_seen(&self, mr_id: &str, at: DateTime<Utc>) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut state = self.read().await?;
        state.last_seen.insert(mr_id.to_string(), at);
        self.write(&state).await
    }

    async fn set_my_username(&self, username: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut state = self.read().await?;
        state.my_username = Some(username.to_string());
        self.write(&state).await?;
        info!("Stored username '{username}' in {}", self.path.display());
        Ok(())
    }
}

/// In-process state, used for `--no-state` runs and tests.
#[derive(Default)]
pub struct MemoryStateStore {
    state: RwLock<PersistedState>,
}

#[cfg(test)]
impl MemoryStateStore {
    pub fn new(my_username: Option<&str>, last_seen: LastSeenTimes) -> Self {
        Self {
            state: RwLock::new(PersistedState {
                my_username: my_username.map(ToString::to_string),
                last_seen,
            }),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn last_seen_times(&self) -> Result<LastSeenTimes> {
        Ok(self.state.read().await.last_seen.clone())
    }

    async fn my_username(&self) -> Result<Option<String>> {
        Ok(self.state.read().await.my_username.clone())
    }

    async fn mark_seen(&self, mr_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.state
            .write()
            .await
            .last_seen
            .insert(mr_id.to_string(), at);
        Ok(())
    }

    async fn set_my_username(&self, username: &str) -> Result<()> {
        self.state.write().await.my_username = Some(username.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("nested").join("state.json"));

        assert!(store.last_seen_times().await.unwrap().is_empty());
        assert_eq!(store.my_username().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glmr").join("state.json");
        let seen: DateTime<Utc> = "2024-05-02T09:30:15Z".parse().unwrap();

        let store = FileStateStore::new(path.clone());
        store.set_my_username("ada").await.unwrap();
        store
            .mark_seen("gid://gitlab/MergeRequest/101", seen)
            .await
            .unwrap();

        let reopened = FileStateStore::new(path);
        assert_eq!(reopened.my_username().await.unwrap().as_deref(), Some("ada"));
        assert_eq!(
            reopened
                .last_seen_times()
                .await
                .unwrap()
                .get("gid://gitlab/MergeRequest/101"),
            Some(&seen)
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStateStore::new(path.clone());
        let err = store.last_seen_times().await.unwrap_err();
        assert!(matches!(err, GlmrError::Storage(_)));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_concurrent_marks_are_all_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        let seen: DateTime<Utc> = "2024-05-02T09:30:15Z".parse().unwrap();

        tokio::try_join!(
            store.mark_seen("gid://gitlab/MergeRequest/1", seen),
            store.mark_seen("gid://gitlab/MergeRequest/2", seen),
            store.set_my_username("ada"),
        )
        .unwrap();

        let reopened = FileStateStore::new(store.path().to_path_buf());
        assert_eq!(reopened.last_seen_times().await.unwrap().len(), 2);
        assert_eq!(reopened.my_username().await.unwrap().as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStateStore::default();
        let seen: DateTime<Utc> = "2024-05-02T09:30:15Z".parse().unwrap();

        store.set_my_username("grace").await.unwrap();
        store.mark_seen("gid://gitlab/MergeRequest/7", seen).await.unwrap();

        assert_eq!(store.my_username().await.unwrap().as_deref(), Some("grace"));
        assert_eq!(store.last_seen_times().await.unwrap().len(), 1);
    }
}
