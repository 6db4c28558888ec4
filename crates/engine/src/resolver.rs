//! Collection resolution and the collection-handle cache
//!
//! A physical collection is identified by `(document type, partition key)`.
//! The resolver turns that pair into a [`CollectionHandle`], asking the
//! database client on the first request and serving later requests from a
//! `DashMap` cache.
//!
//! ## Naming
//!
//! - unpartitioned type: `<base>`
//! - partitioned type:   `<partition_key><separator><base>`
//!
//! where `<base>` is [`Document::collection_name`]. A partition key passed
//! for an unpartitioned type is ignored.
//!
//! ## Concurrency
//!
//! Two tasks missing on the same key at once both ask the client, which is
//! idempotent and hands both the same physical collection. The first handle
//! stored in the cache wins; the other is discarded. Handles for one key are
//! interchangeable, so either outcome is correct.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use docrepo_core::{short_type_name, Document, Result};
use docrepo_storage::{CollectionDriver, DatabaseClient};
use tracing::{debug, trace};

/// Cached reference to a physical collection
#[derive(Clone)]
pub struct CollectionHandle {
    name: Arc<str>,
    driver: Arc<dyn CollectionDriver>,
}

impl CollectionHandle {
    /// Physical collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Driver for the collection
    pub fn driver(&self) -> &dyn CollectionDriver {
        self.driver.as_ref()
    }

    /// True if both handles target the same driver object
    pub fn same_driver(&self, other: &CollectionHandle) -> bool {
        Arc::ptr_eq(&self.driver, &other.driver)
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    document: TypeId,
    partition: Option<String>,
}

/// Resolves `(document type, partition key)` to cached collection handles
pub struct CollectionResolver {
    client: Arc<dyn DatabaseClient>,
    separator: String,
    cache: DashMap<CacheKey, CollectionHandle>,
}

impl CollectionResolver {
    /// Resolver over `client`, joining partition and base name with `separator`
    pub fn new(client: Arc<dyn DatabaseClient>, separator: impl Into<String>) -> Self {
        CollectionResolver {
            client,
            separator: separator.into(),
            cache: DashMap::new(),
        }
    }

    /// Underlying database client
    pub fn client(&self) -> &Arc<dyn DatabaseClient> {
        &self.client
    }

    /// Partition key that takes part in naming for `D`
    fn effective_partition<'a, D: Document>(partition_key: Option<&'a str>) -> Option<&'a str> {
        if D::PARTITIONED {
            partition_key.filter(|pk| !pk.is_empty())
        } else {
            if partition_key.is_some() {
                trace!(
                    document = short_type_name::<D>(),
                    "partition key ignored for unpartitioned type"
                );
            }
            None
        }
    }

    /// Physical collection name for `D` under `partition_key`
    pub fn collection_name<D: Document>(&self, partition_key: Option<&str>) -> String {
        let base = D::collection_name();
        match Self::effective_partition::<D>(partition_key) {
            Some(pk) => format!("{}{}{}", pk, self.separator, base),
            None => base.into_owned(),
        }
    }

    fn cache_key<D: Document>(partition_key: Option<&str>) -> CacheKey {
        CacheKey {
            document: TypeId::of::<D>(),
            partition: Self::effective_partition::<D>(partition_key).map(str::to_string),
        }
    }

    /// Handle for `D` under `partition_key`, created and cached on first use
    ///
    /// # Errors
    ///
    /// Propagates the client's error if the collection cannot be obtained.
    pub async fn resolve<D: Document>(&self, partition_key: Option<&str>) -> Result<CollectionHandle> {
        let key = Self::cache_key::<D>(partition_key);
        if let Some(handle) = self.cache.get(&key) {
            return Ok(handle.clone());
        }

        let name = self.collection_name::<D>(partition_key);
        debug!(collection = %name, document = short_type_name::<D>(), "collection cache miss");
        let driver = self.client.collection(&name).await?;
        let handle = CollectionHandle {
            name: Arc::from(name.as_str()),
            driver,
        };
        Ok(self.cache.entry(key).or_insert(handle).clone())
    }

    /// Forget the cached handle for `D` under `partition_key`
    pub fn evict<D: Document>(&self, partition_key: Option<&str>) -> bool {
        self.cache.remove(&Self::cache_key::<D>(partition_key)).is_some()
    }

    /// Number of cached handles
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl fmt::Debug for CollectionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionResolver")
            .field("database", &self.client.database_name())
            .field("separator", &self.separator)
            .field("cached", &self.cache.len())
            .finish()
    }
}
