//! The key/value record store that the repository persists its collections into.

use crate::error::Res;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Key under which the JSON array of projects is stored.
pub(crate) const PROJECTS_KEY: &str = "fintrack_projects";
/// Key under which the JSON array of transactions is stored.
pub(crate) const TRANSACTIONS_KEY: &str = "fintrack_transactions";
/// Key under which the JSON array of categories is stored.
pub(crate) const CATEGORIES_KEY: &str = "fintrack_categories";

/// Durable string storage addressed by key.
#[async_trait]
pub(crate) trait RecordStore {
    /// Returns the value stored at `key`, or `None` if nothing has been stored there.
    async fn get(&self, key: &str) -> Res<Option<String>>;

    /// Upserts `value` at `key`.
    async fn set(&self, key: &str, value: &str) -> Res<()>;

    /// Upserts all `entries`. Either every entry is written or none are.
    async fn set_many(&self, entries: &[(&str, String)]) -> Res<()>;
}

/// A `RecordStore` that lives only as long as the process. Used in tests.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Res<()> {
        self.records
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Res<()> {
        let mut records = self.records.lock().await;
        for (key, value) in entries {
            records.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_memory_store() {
    let store = MemoryStore::default();
    assert!(store.get(PROJECTS_KEY).await.unwrap().is_none());
    store.set(PROJECTS_KEY, "[]").await.unwrap();
    store
        .set_many(&[
            (PROJECTS_KEY, "[1]".to_string()),
            (CATEGORIES_KEY, "[]".to_string()),
        ])
        .await
        .unwrap();
    assert_eq!(store.get(PROJECTS_KEY).await.unwrap().unwrap(), "[1]");
    assert_eq!(store.get(CATEGORIES_KEY).await.unwrap().unwrap(), "[]");
}
