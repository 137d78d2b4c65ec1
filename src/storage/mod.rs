use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::AppError;

/// Fixed keys for the persisted top-level state.
pub const BOOKINGS_KEY: &str = "bookings";
pub const QUEUE_KEY: &str = "offline_queue";
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// Durable local key-value store: one JSON file per key under the data
/// directory. Reading a missing or corrupt key falls back to the type's
/// default instead of failing.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(err) => {
                warn!(key, error = %err, "failed to read persisted state; using defaults");
                return T::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "persisted state is corrupt; using defaults");
                T::default()
            }
        }
    }

    pub async fn save<T>(&self, key: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| AppError::Storage(format!("create {}: {err}", self.dir.display())))?;

        let json = serde_json::to_vec_pretty(value)
            .map_err(|err| AppError::Storage(format!("serialize {key}: {err}")))?;

        tokio::fs::write(self.path(key), json)
            .await
            .map_err(|err| AppError::Storage(format!("write {key}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::LocalStore;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store.save("numbers", &vec![1u32, 2, 3]).await.unwrap();
        let loaded: Vec<u32> = store.load_or_default("numbers").await;
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_key_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let loaded: Vec<u32> = store.load_or_default("nothing_here").await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn corrupt_key_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        tokio::fs::write(dir.path().join("numbers.json"), b"{ not json")
            .await
            .unwrap();

        let loaded: Vec<u32> = store.load_or_default("numbers").await;
        assert!(loaded.is_empty());
    }
}
