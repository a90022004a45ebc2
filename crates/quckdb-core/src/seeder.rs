use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collection::{Collection, FieldStyle};
use crate::fixtures::SeedSet;
use crate::store::DocumentStore;
use crate::validate::ensure_valid;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedOptions {
    pub style: FieldStyle,
    /// Drop the seeded collections before inserting.
    pub fresh: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub collection: Collection,
    pub inserted: usize,
    pub created: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub collections: Vec<CollectionReport>,
}

impl SeedReport {
    #[must_use]
    pub fn total_inserted(&self) -> usize {
        self.collections.iter().map(|c| c.inserted).sum()
    }

    #[must_use]
    pub fn inserted(&self, collection: Collection) -> usize {
        self.collections
            .iter()
            .find(|c| c.collection == collection)
            .map_or(0, |c| c.inserted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountCheck {
    pub collection: Collection,
    pub expected: u64,
    pub actual: u64,
}

impl CountCheck {
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

pub struct Seeder<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    options: SeedOptions,
}

impl<'a, S: DocumentStore + ?Sized> Seeder<'a, S> {
    pub const fn new(store: &'a S, options: SeedOptions) -> Self {
        Self { store, options }
    }

    /// Insert the dataset, one bulk insert per collection, in
    /// [`Collection::ALL`] order. The first failing insert aborts the run.
    pub async fn run(&self, set: &SeedSet) -> Result<SeedReport> {
        ensure_valid(set)?;

        info!(
            "Seeding {} documents into {} ({} keys)",
            set.total(),
            self.store.describe(),
            self.options.style
        );

        if self.options.fresh {
            for collection in Collection::ALL {
                warn!("Dropping {collection}");
                self.store.drop_collection(collection.as_str()).await?;
            }
        }

        let mut report = SeedReport::default();
        for collection in Collection::ALL {
            let created = if collection == Collection::UserPresence {
                self.store.ensure_collection(collection.as_str()).await?
            } else {
                false
            };
            if created {
                debug!("Created collection {collection}");
            }

            let documents = set.documents(collection, self.options.style);
            let inserted = self
                .store
                .insert_many(collection.as_str(), documents)
                .await?;
            info!("Inserted {inserted} documents into {collection}");

            report.collections.push(CollectionReport {
                collection,
                inserted,
                created,
            });
        }

        Ok(report)
    }

    /// Compare stored counts with the dataset. Only meaningful right after a
    /// `fresh` run, since seeding never deduplicates.
    pub async fn verify(&self, set: &SeedSet) -> Result<Vec<CountCheck>> {
        let mut checks = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            let actual = self.store.count(collection.as_str()).await?;
            let check = CountCheck {
                collection,
                expected: set.len(collection) as u64,
                actual,
            };
            if check.matches() {
                info!("{collection}: {actual} documents MATCH");
            } else {
                warn!(
                    "{collection}: expected {} documents, found {actual}",
                    check.expected
                );
            }
            checks.push(check);
        }
        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::Error;
    use async_trait::async_trait;
    use bson::Document;
    use chrono::Utc;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_seed_inserts_every_collection() {
        let store = MemoryStore::new();
        let set = SeedSet::development(Utc::now());
        let report = Seeder::new(&store, SeedOptions::default())
            .run(&set)
            .await
            .unwrap();

        assert_eq!(report.total_inserted(), 20);
        assert_eq!(report.inserted(Collection::AuditLogs), 7);
        assert_eq!(store.count("user_presence").await.unwrap(), 5);
        assert!(report.collections.last().unwrap().created);
    }

    #[tokio::test]
    async fn test_rerun_is_deterministic_but_not_deduplicated() {
        let store = MemoryStore::new();
        let set = SeedSet::development(Utc::now());
        let seeder = Seeder::new(&store, SeedOptions::default());

        let first = seeder.run(&set).await.unwrap();
        let second = seeder.run(&set).await.unwrap();
        assert_eq!(first.total_inserted(), second.total_inserted());
        assert!(!second.collections.last().unwrap().created);
        assert_eq!(store.count("audit_logs").await.unwrap(), 14);

        let checks = seeder.verify(&set).await.unwrap();
        assert!(checks.iter().all(|c| !c.matches()));
    }

    #[tokio::test]
    async fn test_fresh_run_resets_counts() {
        let store = MemoryStore::new();
        let set = SeedSet::development(Utc::now());
        Seeder::new(&store, SeedOptions::default()).run(&set).await.unwrap();

        let fresh = Seeder::new(
            &store,
            SeedOptions {
                style: FieldStyle::Snake,
                fresh: true,
            },
        );
        fresh.run(&set).await.unwrap();
        let checks = fresh.verify(&set).await.unwrap();
        assert!(checks.iter().all(CountCheck::matches));
        assert!(store.documents("activity_logs").await[0].contains_key("activity_type"));
    }

    #[tokio::test]
    async fn test_invalid_set_is_not_inserted() {
        let store = MemoryStore::new();
        let mut set = SeedSet::development(Utc::now());
        set.file_metadata[0].size_bytes = -1;

        let err = Seeder::new(&store, SeedOptions::default())
            .run(&set)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert!(store.collection_names().await.is_empty());
    }

    struct FailingStore {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentStore for FailingStore {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn ensure_collection(&self, _collection: &str) -> Result<bool> {
            Ok(false)
        }

        async fn insert_many(&self, collection: &str, _documents: Vec<Document>) -> Result<usize> {
            self.calls.lock().unwrap().push(collection.to_string());
            if collection == "activity_logs" {
                return Err(Error::MissingField("activity_logs"));
            }
            Ok(1)
        }

        async fn count(&self, _collection: &str) -> Result<u64> {
            Ok(0)
        }

        async fn drop_collection(&self, _collection: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let store = FailingStore {
            calls: Mutex::new(Vec::new()),
        };
        let set = SeedSet::development(Utc::now());
        let result = Seeder::new(&store, SeedOptions::default()).run(&set).await;

        assert!(result.is_err());
        assert_eq!(
            *store.calls.lock().unwrap(),
            vec!["audit_logs".to_string(), "activity_logs".to_string()]
        );
    }
}
