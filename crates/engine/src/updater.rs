//! Updater: whole-document replace, single-field set and update definitions
//!
//! Instance-based calls (`update_one`, `update_one_field`, ...) match by the
//! document's key and route by its own partition key. Predicate-based calls
//! (`*_matching`) route by `scope.partition_key()` only; the filter is
//! forwarded exactly as given and never has the partition key folded in.
//!
//! Single-document methods return `true` when a document was matched and
//! modified. Multi-document methods return the modified count. Zero matches
//! is not an error.

use std::sync::Arc;

use docrepo_core::{
    routing_partition, to_stored, CancellationToken, Document, Field, Filter, Result, Scope,
    UpdateDefinition, UpdateResult,
};
use serde::Serialize;
use tracing::trace;

use crate::access::{group_by_partition, id_filter, DataAccess};

/// Update operations
#[derive(Debug, Clone)]
pub struct Updater {
    access: Arc<DataAccess>,
}

fn set_field<V: Serialize>(field: &Field<V>, value: V) -> Result<UpdateDefinition> {
    Ok(UpdateDefinition::new().set(field.name(), serde_json::to_value(value)?))
}

fn modified_one(result: UpdateResult) -> bool {
    result.modified == 1
}

impl Updater {
    /// Updater over shared data access
    pub fn new(access: Arc<DataAccess>) -> Self {
        Updater { access }
    }

    // ========================================================================
    // Instance-based
    // ========================================================================

    /// Replace the stored document with the same key
    pub async fn update_one<D: Document>(
        &self,
        document: &D,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool> {
        routing_partition(document)?;
        let filter = id_filter::<D>(document.id())?;
        let replacement = to_stored(document)?;

        let handle = self.access.handle_partitioned(document).await?;
        trace!(collection = handle.name(), "replace_one");
        let result = handle
            .driver()
            .replace_one(&filter, replacement, cancel)
            .await?;
        Ok(modified_one(result))
    }

    /// Set one field of the stored document with the same key
    ///
    /// Other stored fields are left as they are, whatever the in-memory
    /// `document` holds.
    pub async fn update_one_field<D: Document, V: Serialize>(
        &self,
        document: &D,
        field: &Field<V>,
        value: V,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool> {
        let update = set_field(field, value)?;
        self.update_one_definition(document, &update, cancel).await
    }

    /// Apply `update` to the stored document with the same key
    pub async fn update_one_definition<D: Document>(
        &self,
        document: &D,
        update: &UpdateDefinition,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool> {
        routing_partition(document)?;
        let filter = id_filter::<D>(document.id())?;

        let handle = self.access.handle_partitioned(document).await?;
        trace!(collection = handle.name(), "update_one");
        let result = handle.driver().update_one(&filter, update, cancel).await?;
        Ok(modified_one(result))
    }

    /// Replace every given document, one partition group at a time
    ///
    /// Returns the number of documents actually modified.
    pub async fn update_many<D: Document>(
        &self,
        documents: &[D],
        cancel: Option<&CancellationToken>,
    ) -> Result<u64> {
        let mut modified = 0;
        for (partition, group) in group_by_partition(documents)? {
            let handle = self.access.resolve::<D>(partition).await?;
            trace!(collection = handle.name(), count = group.len(), "replace batch");
            for document in group {
                let filter = id_filter::<D>(document.id())?;
                let result = handle
                    .driver()
                    .replace_one(&filter, to_stored(document)?, cancel)
                    .await?;
                modified += result.modified;
            }
        }
        Ok(modified)
    }

    // ========================================================================
    // Predicate-based
    // ========================================================================

    /// Set one field on the first document matching `filter`
    pub async fn update_one_field_matching<D: Document, V: Serialize>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        value: V,
        scope: Scope<'_>,
    ) -> Result<bool> {
        let update = set_field(field, value)?;
        self.update_one_definition_matching::<D>(filter, &update, scope)
            .await
    }

    /// Apply `update` to the first document matching `filter`
    pub async fn update_one_definition_matching<D: Document>(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        scope: Scope<'_>,
    ) -> Result<bool> {
        let handle = self.access.resolve::<D>(scope.partition_key()).await?;
        let result = handle
            .driver()
            .update_one(filter, update, scope.cancel())
            .await?;
        Ok(modified_one(result))
    }

    /// Set one field on every document matching `filter`
    pub async fn update_many_field_matching<D: Document, V: Serialize>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        value: V,
        scope: Scope<'_>,
    ) -> Result<u64> {
        let update = set_field(field, value)?;
        self.update_many_definition_matching::<D>(filter, &update, scope)
            .await
    }

    /// Apply `update` to every document matching `filter`
    pub async fn update_many_definition_matching<D: Document>(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        scope: Scope<'_>,
    ) -> Result<u64> {
        let handle = self.access.resolve::<D>(scope.partition_key()).await?;
        let result = handle
            .driver()
            .update_many(filter, update, scope.cancel())
            .await?;
        Ok(result.modified)
    }
}
