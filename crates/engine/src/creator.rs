//! Creator: key assignment and partition-aware inserts
//!
//! ## Key assignment
//!
//! A document whose key is the default value gets a fresh key from
//! [`KeyGenerator`]. A key that is already set is never overwritten. Key
//! types without a generation strategy fail with
//! [`Error::UnsupportedKeyType`](docrepo_core::Error::UnsupportedKeyType)
//! when a default key is found, so those documents must arrive with a key.
//!
//! ## Batches
//!
//! `add_many` validates and assigns keys for the whole batch first, then
//! issues one `insert_many` per partition group. A batch with a missing
//! partition key or an unsupported default key is rejected before any
//! document is touched.

use std::sync::Arc;

use docrepo_core::{routing_partition, to_stored, CancellationToken, Document, KeyGenerator, Result};
use tracing::trace;

use crate::access::{group_by_partition, stored_batch, DataAccess};

/// Insert operations
#[derive(Debug, Clone)]
pub struct Creator {
    access: Arc<DataAccess>,
}

impl Creator {
    /// Creator over shared data access
    pub fn new(access: Arc<DataAccess>) -> Self {
        Creator { access }
    }

    /// Insert one document, assigning a key if it has none
    ///
    /// # Errors
    ///
    /// - `MissingPartitionKey` / `UnsupportedKeyType` before any I/O
    /// - driver write errors (duplicate key, validation) unchanged
    pub async fn add_one<D: Document>(
        &self,
        document: &mut D,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        routing_partition(&*document)?;
        assign_key(document)?;
        let stored = to_stored(&*document)?;

        let handle = self.access.handle_partitioned(&*document).await?;
        trace!(collection = handle.name(), "add_one");
        handle.driver().insert_one(stored, cancel).await?;
        Ok(())
    }

    /// Insert a batch, one driver call per partition
    ///
    /// An empty batch is a no-op. Order within each partition group is the
    /// submission order.
    pub async fn add_many<D: Document>(
        &self,
        documents: &mut [D],
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        for document in documents.iter() {
            routing_partition(document)?;
        }
        if documents.iter().any(|d| KeyGenerator::needs_key(d.id())) {
            KeyGenerator::ensure_supported::<D::Key>()?;
        }
        for document in documents.iter_mut() {
            assign_key(document)?;
        }

        let mut batches = Vec::new();
        for (partition, group) in group_by_partition(&*documents)? {
            batches.push((partition, stored_batch(&group)?));
        }

        for (partition, stored) in batches {
            let handle = self.access.resolve::<D>(partition).await?;
            trace!(collection = handle.name(), count = stored.len(), "add_many");
            handle.driver().insert_many(stored, cancel).await?;
        }
        Ok(())
    }
}

fn assign_key<D: Document>(document: &mut D) -> Result<()> {
    if KeyGenerator::needs_key(document.id()) {
        document.set_id(KeyGenerator::new_key::<D::Key>()?);
    }
    Ok(())
}
