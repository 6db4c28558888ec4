//! Index lifecycle for the collection of a document type
//!
//! Indexes without an explicit name get the deterministic name described in
//! [`docrepo_core::index`], e.g. `amount_1` or `title_text_body_text`.

use std::sync::Arc;

use docrepo_core::{Document, Error, IndexKind, IndexModel, IndexOptions, Result, Scope};
use tracing::info;

use crate::access::DataAccess;

/// Create, list and drop indexes
#[derive(Debug, Clone)]
pub struct IndexManager {
    access: Arc<DataAccess>,
}

impl IndexManager {
    /// Index manager over shared data access
    pub fn new(access: Arc<DataAccess>) -> Self {
        IndexManager { access }
    }

    /// Ascending index on `field`
    pub async fn create_ascending_index<D: Document>(
        &self,
        field: &str,
        options: IndexOptions,
        scope: Scope<'_>,
    ) -> Result<String> {
        self.create_index::<D>(IndexModel::single(field, IndexKind::Ascending, options), scope)
            .await
    }

    /// Descending index on `field`
    pub async fn create_descending_index<D: Document>(
        &self,
        field: &str,
        options: IndexOptions,
        scope: Scope<'_>,
    ) -> Result<String> {
        self.create_index::<D>(IndexModel::single(field, IndexKind::Descending, options), scope)
            .await
    }

    /// Hashed index on `field`
    pub async fn create_hashed_index<D: Document>(
        &self,
        field: &str,
        options: IndexOptions,
        scope: Scope<'_>,
    ) -> Result<String> {
        self.create_index::<D>(IndexModel::single(field, IndexKind::Hashed, options), scope)
            .await
    }

    /// Text index on `field`
    pub async fn create_text_index<D: Document>(
        &self,
        field: &str,
        options: IndexOptions,
        scope: Scope<'_>,
    ) -> Result<String> {
        self.create_index::<D>(IndexModel::single(field, IndexKind::Text, options), scope)
            .await
    }

    /// One text index spanning several fields
    pub async fn create_combined_text_index<D: Document>(
        &self,
        fields: &[&str],
        options: IndexOptions,
        scope: Scope<'_>,
    ) -> Result<String> {
        let keys = fields
            .iter()
            .map(|f| (f.to_string(), IndexKind::Text))
            .collect();
        self.create_index::<D>(IndexModel::compound(keys, options), scope)
            .await
    }

    /// Create an arbitrary index, returning its name
    ///
    /// Creating an identical index again is a no-op that returns the same
    /// name.
    pub async fn create_index<D: Document>(&self, model: IndexModel, scope: Scope<'_>) -> Result<String> {
        validate(&model)?;
        let handle = self.access.resolve::<D>(scope.partition_key()).await?;
        let name = handle.driver().create_index(model, scope.cancel()).await?;
        info!(collection = handle.name(), index = %name, "index created");
        Ok(name)
    }

    /// Names of every index on the collection, the primary-key index first
    pub async fn get_index_names<D: Document>(&self, scope: Scope<'_>) -> Result<Vec<String>> {
        let handle = self.access.resolve::<D>(scope.partition_key()).await?;
        Ok(handle.driver().list_index_names(scope.cancel()).await?)
    }

    /// Drop the named index
    pub async fn drop_index<D: Document>(&self, name: &str, scope: Scope<'_>) -> Result<()> {
        let handle = self.access.resolve::<D>(scope.partition_key()).await?;
        handle.driver().drop_index(name, scope.cancel()).await?;
        info!(collection = handle.name(), index = name, "index dropped");
        Ok(())
    }
}

fn validate(model: &IndexModel) -> Result<()> {
    if model.keys().is_empty() {
        return Err(Error::invalid_argument("an index needs at least one field"));
    }
    if model.keys().iter().any(|(field, _)| field.is_empty()) {
        return Err(Error::invalid_argument("index field names must not be empty"));
    }
    if model.is_unique() && !model.keys().iter().all(|(_, kind)| kind.supports_unique()) {
        return Err(Error::invalid_argument(
            "only ascending and descending indexes can be unique",
        ));
    }
    Ok(())
}
