//! In-memory database client

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use docrepo_core::DriverResult;
use tracing::debug;

use super::MemoryCollection;
use crate::traits::{CollectionDriver, DatabaseClient};

/// Database client holding every collection in process memory
///
/// Collections are kept in a `DashMap`; `collection()` goes through the
/// map's entry API so concurrent first requests for one name create exactly
/// one physical collection. Entries are never removed: a drop empties the
/// collection in place, so handles obtained before the drop stay attached
/// to the same collection.
#[derive(Debug)]
pub struct MemoryClient {
    database: String,
    collections: DashMap<String, Arc<MemoryCollection>>,
    created: AtomicU64,
}

impl MemoryClient {
    /// Empty database named `database`
    pub fn new(database: impl Into<String>) -> Self {
        MemoryClient {
            database: database.into(),
            collections: DashMap::new(),
            created: AtomicU64::new(0),
        }
    }

    /// Empty database behind an `Arc`, ready to hand to a repository
    pub fn shared(database: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(database))
    }

    /// Number of physical collections created over the client's lifetime
    pub fn collections_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Concrete collection by name, if it exists and is not dropped
    pub fn get(&self, name: &str) -> Option<Arc<MemoryCollection>> {
        self.collections
            .get(name)
            .filter(|c| !c.is_dropped())
            .map(|c| Arc::clone(c.value()))
    }
}

#[async_trait]
impl DatabaseClient for MemoryClient {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn collection(&self, name: &str) -> DriverResult<Arc<dyn CollectionDriver>> {
        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                self.created.fetch_add(1, Ordering::Relaxed);
                debug!(database = %self.database, collection = name, "collection created");
                Arc::new(MemoryCollection::new(name))
            })
            .clone();
        if collection.revive() {
            debug!(database = %self.database, collection = name, "collection recreated");
        }
        let collection: Arc<dyn CollectionDriver> = collection;
        Ok(collection)
    }

    async fn list_collection_names(&self) -> DriverResult<Vec<String>> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .filter(|e| !e.value().is_dropped())
            .map(|e| e.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> DriverResult<bool> {
        let dropped = self
            .collections
            .get(name)
            .map_or(false, |c| c.drop_in_place());
        if dropped {
            debug!(database = %self.database, collection = name, "collection dropped");
        }
        Ok(dropped)
    }
}
