//! In-process `KvStore` backed by a concurrent hash map.
//!
//! Used for ephemeral sessions and tests. Nothing survives the process.

use dashmap::DashMap;
use relmem_types::error::RepositoryError;

use super::kv_store::KvStore;

#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    entries: DashMap<String, serde_json::Value>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, RepositoryError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), RepositoryError> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, RepositoryError> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = InMemoryKvStore::new();
        let value = serde_json::json!({"a": [1, 2, 3]});
        store.set("entities", &value).await.unwrap();
        assert_eq!(store.get("entities").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_set_upserts_and_delete_is_noop_when_missing() {
        let store = InMemoryKvStore::new();
        store.set("facts", &serde_json::json!(1)).await.unwrap();
        store.set("facts", &serde_json::json!(2)).await.unwrap();
        assert_eq!(store.get("facts").await.unwrap(), Some(serde_json::json!(2)));

        store.delete("nope").await.unwrap();
        store.delete("facts").await.unwrap();
        assert!(store.get("facts").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keys_sorted() {
        let store = InMemoryKvStore::new();
        for key in ["relationships", "entities", "facts"] {
            store.set(key, &serde_json::json!([])).await.unwrap();
        }
        assert_eq!(
            store.list_keys().await.unwrap(),
            vec!["entities", "facts", "relationships"]
        );
    }
}
