mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use bson::Document;

use crate::Result;

/// The handful of collection operations the seeder needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable target, used in logs.
    fn describe(&self) -> String;

    /// Create `collection` unless it exists. Returns whether it was created.
    async fn ensure_collection(&self, collection: &str) -> Result<bool>;

    /// Insert all documents in one call. Returns the number inserted.
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<usize>;

    async fn count(&self, collection: &str) -> Result<u64>;

    async fn drop_collection(&self, collection: &str) -> Result<()>;
}
