//! Synchronous variants of the repository facades
//!
//! Each blocking facade owns (a shared handle to) a current-thread tokio
//! runtime and drives the async operation to completion on the calling
//! thread.
//!
//! # Panics
//!
//! Calling into a blocking facade from inside an async runtime panics, as
//! `Runtime::block_on` does. Use the async facades there.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use docrepo_core::{
    CancellationToken, Document, DriverError, Error, Field, Filter, Grouping, IndexModel,
    IndexOptions, Page, Projection, Result, Scope, SortDefinition, UpdateDefinition,
};
use docrepo_storage::DatabaseClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::{Builder, Runtime};

use crate::config::RepositoryConfig;
use crate::repository;

fn build_runtime() -> Result<Arc<Runtime>> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Driver(DriverError::Internal(format!("failed to start runtime: {}", e))))?;
    Ok(Arc::new(runtime))
}

// ============================================================================
// Repository
// ============================================================================

/// Blocking entry point over one database
#[derive(Clone)]
pub struct Repository {
    inner: repository::Repository,
    runtime: Arc<Runtime>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("blocking::Repository")
            .field("inner", &self.inner)
            .finish()
    }
}

impl Repository {
    /// Blocking repository over `client`
    pub fn new(client: Arc<dyn DatabaseClient>, config: RepositoryConfig) -> Result<Self> {
        Ok(Repository {
            inner: repository::Repository::new(client, config)?,
            runtime: build_runtime()?,
        })
    }

    /// Blocking repository over a fresh in-memory database
    pub fn in_memory(config: RepositoryConfig) -> Result<Self> {
        Ok(Repository {
            inner: repository::Repository::in_memory(config)?,
            runtime: build_runtime()?,
        })
    }

    /// Wrap an async repository
    pub fn from_async(inner: repository::Repository) -> Result<Self> {
        Ok(Repository {
            inner,
            runtime: build_runtime()?,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The async repository behind this facade
    pub fn as_async(&self) -> &repository::Repository {
        &self.inner
    }

    /// Blocking view for document type `D`
    pub fn documents<D: Document>(&self) -> DocumentRepository<D> {
        DocumentRepository {
            inner: self.inner.documents::<D>(),
            runtime: Arc::clone(&self.runtime),
        }
    }

    /// Physical collection name for `D` under `partition_key`
    pub fn collection_name<D: Document>(&self, partition_key: Option<&str>) -> String {
        self.inner.collection_name::<D>(partition_key)
    }

    /// See [`repository::Repository::drop_collection`]
    pub fn drop_collection<D: Document>(&self, scope: Scope<'_>) -> Result<bool> {
        self.block_on(self.inner.drop_collection::<D>(scope))
    }

    /// See [`repository::Repository::list_collection_names`]
    pub fn list_collection_names(&self) -> Result<Vec<String>> {
        self.block_on(self.inner.list_collection_names())
    }

    // --- indexes ---

    /// See [`crate::IndexManager::create_ascending_index`]
    pub fn create_ascending_index<D: Document>(&self, field: &str, options: IndexOptions, scope: Scope<'_>) -> Result<String> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.create_ascending_index::<D>(field, options, scope))
    }

    /// See [`crate::IndexManager::create_descending_index`]
    pub fn create_descending_index<D: Document>(&self, field: &str, options: IndexOptions, scope: Scope<'_>) -> Result<String> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.create_descending_index::<D>(field, options, scope))
    }

    /// See [`crate::IndexManager::create_hashed_index`]
    pub fn create_hashed_index<D: Document>(&self, field: &str, options: IndexOptions, scope: Scope<'_>) -> Result<String> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.create_hashed_index::<D>(field, options, scope))
    }

    /// See [`crate::IndexManager::create_text_index`]
    pub fn create_text_index<D: Document>(&self, field: &str, options: IndexOptions, scope: Scope<'_>) -> Result<String> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.create_text_index::<D>(field, options, scope))
    }

    /// See [`crate::IndexManager::create_combined_text_index`]
    pub fn create_combined_text_index<D: Document>(
        &self,
        fields: &[&str],
        options: IndexOptions,
        scope: Scope<'_>,
    ) -> Result<String> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.create_combined_text_index::<D>(fields, options, scope))
    }

    /// See [`crate::IndexManager::create_index`]
    pub fn create_index<D: Document>(&self, model: IndexModel, scope: Scope<'_>) -> Result<String> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.create_index::<D>(model, scope))
    }

    /// See [`crate::IndexManager::get_index_names`]
    pub fn get_index_names<D: Document>(&self, scope: Scope<'_>) -> Result<Vec<String>> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.get_index_names::<D>(scope))
    }

    /// See [`crate::IndexManager::drop_index`]
    pub fn drop_index<D: Document>(&self, name: &str, scope: Scope<'_>) -> Result<()> {
        let indexes = self.inner.index_manager();
        self.block_on(indexes.drop_index::<D>(name, scope))
    }
}

// ============================================================================
// DocumentRepository
// ============================================================================

/// Blocking view of every repository operation for one document type
pub struct DocumentRepository<D> {
    inner: repository::DocumentRepository<D>,
    runtime: Arc<Runtime>,
}

impl<D> Clone for DocumentRepository<D> {
    fn clone(&self) -> Self {
        DocumentRepository {
            inner: self.inner.clone(),
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<D> fmt::Debug for DocumentRepository<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("blocking::DocumentRepository")
            .field("document", &std::any::type_name::<D>())
            .finish()
    }
}

impl<D: Document> DocumentRepository<D> {
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Physical collection name under `partition_key`
    pub fn collection_name(&self, partition_key: Option<&str>) -> String {
        self.inner.collection_name(partition_key)
    }

    /// First page using the configured default page size
    pub fn default_page(&self) -> Page {
        self.inner.default_page()
    }

    /// Insert one document, assigning a key if it has none
    pub fn add_one(&self, document: &mut D, cancel: Option<&CancellationToken>) -> Result<()> {
        self.block_on(self.inner.add_one(document, cancel))
    }

    /// Insert a batch, one driver call per partition
    pub fn add_many(&self, documents: &mut [D], cancel: Option<&CancellationToken>) -> Result<()> {
        self.block_on(self.inner.add_many(documents, cancel))
    }

    /// Document with the given key
    pub fn get_by_id(&self, id: &D::Key, scope: Scope<'_>) -> Result<Option<D>> {
        self.block_on(self.inner.get_by_id(id, scope))
    }

    /// First matching document
    pub fn get_one(&self, filter: &Filter, scope: Scope<'_>) -> Result<Option<D>> {
        self.block_on(self.inner.get_one(filter, scope))
    }

    /// All matching documents
    pub fn get_all(&self, filter: &Filter, scope: Scope<'_>) -> Result<Vec<D>> {
        self.block_on(self.inner.get_all(filter, scope))
    }

    /// True if at least one document matches
    pub fn any(&self, filter: &Filter, scope: Scope<'_>) -> Result<bool> {
        self.block_on(self.inner.any(filter, scope))
    }

    /// Number of matching documents
    pub fn count(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        self.block_on(self.inner.count(filter, scope))
    }

    /// Matching document with the largest `field`
    pub fn get_by_max<V>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<Option<D>> {
        self.block_on(self.inner.get_by_max(filter, field, scope))
    }

    /// Matching document with the smallest `field`
    pub fn get_by_min<V>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<Option<D>> {
        self.block_on(self.inner.get_by_min(filter, field, scope))
    }

    /// Largest value of `field`
    pub fn get_max_value<V: DeserializeOwned>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<Option<V>> {
        self.block_on(self.inner.get_max_value(filter, field, scope))
    }

    /// Smallest value of `field`
    pub fn get_min_value<V: DeserializeOwned>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<Option<V>> {
        self.block_on(self.inner.get_min_value(filter, field, scope))
    }

    /// Sum of `field` over matching documents
    pub fn sum_by<V: DeserializeOwned>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<V> {
        self.block_on(self.inner.sum_by(filter, field, scope))
    }

    /// First matching document shaped by `projection`
    pub fn project_one<P: DeserializeOwned>(&self, filter: &Filter, projection: &Projection, scope: Scope<'_>) -> Result<Option<P>> {
        self.block_on(self.inner.project_one(filter, projection, scope))
    }

    /// Every matching document shaped by `projection`
    pub fn project_many<P: DeserializeOwned>(&self, filter: &Filter, projection: &Projection, scope: Scope<'_>) -> Result<Vec<P>> {
        self.block_on(self.inner.project_many(filter, projection, scope))
    }

    /// Group every document by `key`
    pub fn group_by<K, R, F>(&self, key: &Field<K>, project: F, scope: Scope<'_>) -> Result<Vec<R>>
    where
        K: DeserializeOwned,
        F: Fn(Grouping<K, D>) -> R,
    {
        self.block_on(self.inner.group_by(key, project, scope))
    }

    /// Group matching documents by `key`
    pub fn group_by_filtered<K, R, F>(&self, filter: &Filter, key: &Field<K>, project: F, scope: Scope<'_>) -> Result<Vec<R>>
    where
        K: DeserializeOwned,
        F: Fn(Grouping<K, D>) -> R,
    {
        self.block_on(self.inner.group_by_filtered(filter, key, project, scope))
    }

    /// One page sorted by a single field
    pub fn get_sorted_paginated<V>(
        &self,
        filter: &Filter,
        sort_by: &Field<V>,
        ascending: bool,
        page: Page,
        scope: Scope<'_>,
    ) -> Result<Vec<D>> {
        self.block_on(self.inner.get_sorted_paginated(filter, sort_by, ascending, page, scope))
    }

    /// One page sorted by a full sort definition
    pub fn get_sorted_paginated_by(&self, filter: &Filter, sort: &SortDefinition, page: Page, scope: Scope<'_>) -> Result<Vec<D>> {
        self.block_on(self.inner.get_sorted_paginated_by(filter, sort, page, scope))
    }

    /// Replace the stored document with the same key
    pub fn update_one(&self, document: &D, cancel: Option<&CancellationToken>) -> Result<bool> {
        self.block_on(self.inner.update_one(document, cancel))
    }

    /// Set one field of the stored document with the same key
    pub fn update_one_field<V: Serialize>(
        &self,
        document: &D,
        field: &Field<V>,
        value: V,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool> {
        self.block_on(self.inner.update_one_field(document, field, value, cancel))
    }

    /// Apply `update` to the stored document with the same key
    pub fn update_one_definition(&self, document: &D, update: &UpdateDefinition, cancel: Option<&CancellationToken>) -> Result<bool> {
        self.block_on(self.inner.update_one_definition(document, update, cancel))
    }

    /// Set one field on the first document matching `filter`
    pub fn update_one_field_matching<V: Serialize>(&self, filter: &Filter, field: &Field<V>, value: V, scope: Scope<'_>) -> Result<bool> {
        self.block_on(self.inner.update_one_field_matching(filter, field, value, scope))
    }

    /// Apply `update` to the first document matching `filter`
    pub fn update_one_definition_matching(&self, filter: &Filter, update: &UpdateDefinition, scope: Scope<'_>) -> Result<bool> {
        self.block_on(self.inner.update_one_definition_matching(filter, update, scope))
    }

    /// Replace every given document
    pub fn update_many(&self, documents: &[D], cancel: Option<&CancellationToken>) -> Result<u64> {
        self.block_on(self.inner.update_many(documents, cancel))
    }

    /// Set one field on every document matching `filter`
    pub fn update_many_field_matching<V: Serialize>(&self, filter: &Filter, field: &Field<V>, value: V, scope: Scope<'_>) -> Result<u64> {
        self.block_on(self.inner.update_many_field_matching(filter, field, value, scope))
    }

    /// Apply `update` to every document matching `filter`
    pub fn update_many_definition_matching(&self, filter: &Filter, update: &UpdateDefinition, scope: Scope<'_>) -> Result<u64> {
        self.block_on(self.inner.update_many_definition_matching(filter, update, scope))
    }

    /// Delete the stored document with the same key
    pub fn delete_one(&self, document: &D, cancel: Option<&CancellationToken>) -> Result<u64> {
        self.block_on(self.inner.delete_one(document, cancel))
    }

    /// Delete the first document matching `filter`
    pub fn delete_one_matching(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        self.block_on(self.inner.delete_one_matching(filter, scope))
    }

    /// Delete the document with key `id`
    pub fn delete_by_id(&self, id: &D::Key, scope: Scope<'_>) -> Result<u64> {
        self.block_on(self.inner.delete_by_id(id, scope))
    }

    /// Delete every given document
    pub fn delete_many(&self, documents: &[D], cancel: Option<&CancellationToken>) -> Result<u64> {
        self.block_on(self.inner.delete_many(documents, cancel))
    }

    /// Delete every document matching `filter`
    pub fn delete_many_matching(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        self.block_on(self.inner.delete_many_matching(filter, scope))
    }
}
