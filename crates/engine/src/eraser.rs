//! Eraser: deletes by instance, key or predicate
//!
//! Single-document deletes return 1 or 0, multi-document deletes the
//! deleted count. A batch of documents spanning partitions is split the same
//! way inserts are: one `delete_many` per partition group.

use std::sync::Arc;

use docrepo_core::{routing_partition, CancellationToken, Document, Filter, Result, Scope};
use tracing::trace;

use crate::access::{group_by_partition, id_filter, ids_filter, DataAccess};

/// Delete operations
#[derive(Debug, Clone)]
pub struct Eraser {
    access: Arc<DataAccess>,
}

impl Eraser {
    /// Eraser over shared data access
    pub fn new(access: Arc<DataAccess>) -> Self {
        Eraser { access }
    }

    /// Delete the stored document with the same key as `document`
    pub async fn delete_one<D: Document>(
        &self,
        document: &D,
        cancel: Option<&CancellationToken>,
    ) -> Result<u64> {
        routing_partition(document)?;
        let filter = id_filter::<D>(document.id())?;
        let handle = self.access.handle_partitioned(document).await?;
        trace!(collection = handle.name(), "delete_one");
        Ok(handle.driver().delete_one(&filter, cancel).await?)
    }

    /// Delete the first document matching `filter`
    pub async fn delete_one_matching<D: Document>(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        let handle = self.access.resolve::<D>(scope.partition_key()).await?;
        Ok(handle.driver().delete_one(filter, scope.cancel()).await?)
    }

    /// Delete the document with key `id`
    pub async fn delete_by_id<D: Document>(&self, id: &D::Key, scope: Scope<'_>) -> Result<u64> {
        let filter = id_filter::<D>(id)?;
        self.delete_one_matching::<D>(&filter, scope).await
    }

    /// Delete every given document, one driver call per partition
    pub async fn delete_many<D: Document>(
        &self,
        documents: &[D],
        cancel: Option<&CancellationToken>,
    ) -> Result<u64> {
        let mut batches = Vec::new();
        for (partition, group) in group_by_partition(documents)? {
            batches.push((partition, ids_filter::<D>(&group)?));
        }

        let mut deleted = 0;
        for (partition, filter) in batches {
            let handle = self.access.resolve::<D>(partition).await?;
            trace!(collection = handle.name(), "delete batch");
            deleted += handle.driver().delete_many(&filter, cancel).await?;
        }
        Ok(deleted)
    }

    /// Delete every document matching `filter`
    pub async fn delete_many_matching<D: Document>(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        let handle = self.access.resolve::<D>(scope.partition_key()).await?;
        Ok(handle.driver().delete_many(filter, scope.cancel()).await?)
    }
}
