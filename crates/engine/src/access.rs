//! Shared data-access base for the Creator, Reader, Updater, Eraser and
//! IndexManager facades
//!
//! Every operation routes through [`DataAccess::resolve`] (predicate-based
//! calls) or [`DataAccess::handle_partitioned`] (instance-based calls). Both
//! end in the [`CollectionResolver`] cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use docrepo_core::{
    key_to_stored, routing_partition, to_stored, Document, Filter, JsonValue, Result, ID_FIELD,
};
use docrepo_storage::DatabaseClient;
use tracing::debug;

use crate::config::RepositoryConfig;
use crate::resolver::{CollectionHandle, CollectionResolver};

/// Documents of one physical collection, in submission order
pub(crate) type PartitionBatch<'d, T> = (Option<&'d str>, Vec<T>);

/// Collection resolution plus the repository configuration
#[derive(Debug)]
pub struct DataAccess {
    resolver: CollectionResolver,
    config: RepositoryConfig,
}

impl DataAccess {
    /// Data access over `client` using `config`
    pub fn new(client: Arc<dyn DatabaseClient>, config: RepositoryConfig) -> Self {
        let resolver = CollectionResolver::new(client, config.partition_separator.clone());
        DataAccess { resolver, config }
    }

    /// Active configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Underlying database client
    pub fn client(&self) -> &Arc<dyn DatabaseClient> {
        self.resolver.client()
    }

    /// Collection resolver
    pub fn resolver(&self) -> &CollectionResolver {
        &self.resolver
    }

    /// Handle for `D` under an explicit partition key
    pub async fn resolve<D: Document>(&self, partition_key: Option<&str>) -> Result<CollectionHandle> {
        self.resolver.resolve::<D>(partition_key).await
    }

    /// Handle for the collection `document` belongs to
    ///
    /// # Errors
    ///
    /// Returns [`docrepo_core::Error::MissingPartitionKey`] for a partitioned
    /// document without a partition key, before touching the client.
    pub async fn handle_partitioned<D: Document>(&self, document: &D) -> Result<CollectionHandle> {
        let partition = routing_partition(document)?;
        self.resolver.resolve::<D>(partition).await
    }

    /// Physical collection name for `D` under `partition_key`
    pub fn collection_name<D: Document>(&self, partition_key: Option<&str>) -> String {
        self.resolver.collection_name::<D>(partition_key)
    }

    /// Number of cached collection handles
    pub fn cached_collections(&self) -> usize {
        self.resolver.cached()
    }
}

// ============================================================================
// Helpers shared by the facades
// ============================================================================

/// Filter matching one primary key
pub(crate) fn id_filter<D: Document>(key: &D::Key) -> Result<Filter> {
    Ok(Filter::eq(ID_FIELD, key_to_stored(key)?))
}

/// Filter matching any of the given documents by primary key
pub(crate) fn ids_filter<D: Document>(documents: &[&D]) -> Result<Filter> {
    let keys = documents
        .iter()
        .map(|d| key_to_stored(d.id()))
        .collect::<Result<Vec<JsonValue>>>()?;
    Ok(Filter::is_in(ID_FIELD, keys))
}

/// Split documents by routing partition, keeping submission order in each
/// group
///
/// Every document is checked before anything is returned, so a missing
/// partition key fails the whole batch.
pub(crate) fn group_by_partition<D: Document>(
    documents: &[D],
) -> Result<Vec<PartitionBatch<'_, &D>>> {
    let mut groups: BTreeMap<Option<&str>, Vec<&D>> = BTreeMap::new();
    for document in documents {
        let partition = routing_partition(document)?;
        groups.entry(partition).or_default().push(document);
    }
    if groups.len() > 1 {
        debug!(groups = groups.len(), documents = documents.len(), "batch split by partition");
    }
    Ok(groups.into_iter().collect())
}

/// Stored forms of a partition group
pub(crate) fn stored_batch<D: Document>(documents: &[&D]) -> Result<Vec<JsonValue>> {
    documents.iter().map(|d| to_stored(*d)).collect()
}
