use std::collections::BTreeMap;

use async_trait::async_trait;
use bson::Document;
use tokio::sync::Mutex;

use super::DocumentStore;
use crate::Result;

/// In-process store. Backs `--dry-run` and the seeder tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one collection's documents in insert order.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn collection_names(&self) -> Vec<String> {
        self.collections.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn ensure_collection(&self, collection: &str) -> Result<bool> {
        let mut collections = self.collections.lock().await;
        if collections.contains_key(collection) {
            return Ok(false);
        }
        collections.insert(collection.to_string(), Vec::new());
        Ok(true)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<usize> {
        let inserted = documents.len();
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(inserted)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.lock().await;
        Ok(collections.get(collection).map_or(0, |docs| docs.len() as u64))
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.collections.lock().await.remove(collection);
        Ok(())
    }
}
