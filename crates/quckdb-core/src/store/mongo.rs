use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::{Client, Database};

use super::DocumentStore;
use crate::Result;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect to `uri` and select `database`, failing fast if the server
    /// does not answer a ping.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!("Connected to MongoDB database '{}'", db.name());
        Ok(Self { db })
    }

    #[must_use]
    pub const fn from_database(db: Database) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn describe(&self) -> String {
        format!("mongodb:{}", self.db.name())
    }

    async fn ensure_collection(&self, collection: &str) -> Result<bool> {
        let existing = self
            .db
            .list_collection_names()
            .filter(doc! { "name": collection })
            .await?;
        if existing.iter().any(|name| name == collection) {
            return Ok(false);
        }
        self.db.create_collection(collection).await?;
        Ok(true)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let result = self
            .db
            .collection::<Document>(collection)
            .insert_many(documents)
            .await?;
        Ok(result.inserted_ids.len())
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let count = self
            .db
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?;
        Ok(count)
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.db.collection::<Document>(collection).drop().await?;
        Ok(())
    }
}
