//! Repository facades
//!
//! [`Repository`] is the entry point: built once per database client, cheap
//! to clone, and generic over the document type at each call.
//! [`DocumentRepository<D>`] fixes the document type (and through `D::Key`
//! the key type) so call sites need no turbofish.
//!
//! ```
//! # use docrepo_engine::{Repository, RepositoryConfig};
//! # use docrepo_core::{Document, Field, Filter, Scope, Uuid};
//! # use serde::{Deserialize, Serialize};
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Order {
//!     #[serde(rename = "_id")]
//!     id: Uuid,
//!     shop: String,
//!     total: i64,
//! }
//!
//! impl Document for Order {
//!     type Key = Uuid;
//!     const PARTITIONED: bool = true;
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn set_id(&mut self, id: Uuid) { self.id = id; }
//!     fn partition_key(&self) -> Option<&str> { Some(&self.shop) }
//! }
//!
//! # tokio_test_block_on(async {
//! let repo = Repository::in_memory(RepositoryConfig::default()).unwrap();
//! let orders = repo.documents::<Order>();
//!
//! let mut order = Order { id: Uuid::nil(), shop: "north".into(), total: 12 };
//! orders.add_one(&mut order, None).await.unwrap();
//!
//! const TOTAL: Field<i64> = Field::new("total");
//! let n = orders.count(&TOTAL.gt(10), Scope::partition("north")).await.unwrap();
//! assert_eq!(n, 1);
//! assert_eq!(repo.collection_name::<Order>(Some("north")), "north-Order");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use docrepo_core::{
    CancellationToken, Document, Field, Filter, Grouping, Page, Projection, Result, Scope,
    SortDefinition, UpdateDefinition,
};
use docrepo_storage::{DatabaseClient, MemoryClient};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::access::DataAccess;
use crate::config::RepositoryConfig;
use crate::creator::Creator;
use crate::eraser::Eraser;
use crate::index_manager::IndexManager;
use crate::reader::Reader;
use crate::updater::Updater;

// ============================================================================
// Repository
// ============================================================================

/// Entry point over one database
#[derive(Debug, Clone)]
pub struct Repository {
    access: Arc<DataAccess>,
}

impl Repository {
    /// Repository over `client`
    ///
    /// # Errors
    ///
    /// Returns [`docrepo_core::Error::Config`] if `config` is invalid.
    pub fn new(client: Arc<dyn DatabaseClient>, config: RepositoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Repository {
            access: Arc::new(DataAccess::new(client, config)),
        })
    }

    /// Repository over a fresh in-memory database named by `config`
    pub fn in_memory(config: RepositoryConfig) -> Result<Self> {
        let client = MemoryClient::shared(config.database.clone());
        Self::new(client, config)
    }

    /// Shared data access
    pub fn access(&self) -> &Arc<DataAccess> {
        &self.access
    }

    /// Active configuration
    pub fn config(&self) -> &RepositoryConfig {
        self.access.config()
    }

    /// Typed view for document type `D`
    pub fn documents<D: Document>(&self) -> DocumentRepository<D> {
        DocumentRepository {
            access: Arc::clone(&self.access),
            _document: PhantomData,
        }
    }

    /// Insert operations
    pub fn creator(&self) -> Creator {
        Creator::new(Arc::clone(&self.access))
    }

    /// Read operations
    pub fn reader(&self) -> Reader {
        Reader::new(Arc::clone(&self.access))
    }

    /// Update operations
    pub fn updater(&self) -> Updater {
        Updater::new(Arc::clone(&self.access))
    }

    /// Delete operations
    pub fn eraser(&self) -> Eraser {
        Eraser::new(Arc::clone(&self.access))
    }

    /// Index operations
    pub fn index_manager(&self) -> IndexManager {
        IndexManager::new(Arc::clone(&self.access))
    }

    /// Physical collection name for `D` under `partition_key`
    pub fn collection_name<D: Document>(&self, partition_key: Option<&str>) -> String {
        self.access.collection_name::<D>(partition_key)
    }

    /// Drop the collection of `D` in `scope`, with its documents and indexes
    ///
    /// Returns `false` if the collection did not exist.
    pub async fn drop_collection<D: Document>(&self, scope: Scope<'_>) -> Result<bool> {
        let name = self.collection_name::<D>(scope.partition_key());
        let dropped = self.access.client().drop_collection(&name).await?;
        self.access.resolver().evict::<D>(scope.partition_key());
        info!(collection = %name, dropped, "collection dropped");
        Ok(dropped)
    }

    /// Names of every physical collection in the database
    pub async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self.access.client().list_collection_names().await?)
    }
}

// ============================================================================
// DocumentRepository
// ============================================================================

/// Every repository operation for one document type
pub struct DocumentRepository<D> {
    access: Arc<DataAccess>,
    _document: PhantomData<fn() -> D>,
}

impl<D> Clone for DocumentRepository<D> {
    fn clone(&self) -> Self {
        DocumentRepository {
            access: Arc::clone(&self.access),
            _document: PhantomData,
        }
    }
}

impl<D> fmt::Debug for DocumentRepository<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRepository")
            .field("document", &std::any::type_name::<D>())
            .finish()
    }
}

impl<D: Document> DocumentRepository<D> {
    fn creator(&self) -> Creator {
        Creator::new(Arc::clone(&self.access))
    }

    fn reader(&self) -> Reader {
        Reader::new(Arc::clone(&self.access))
    }

    fn updater(&self) -> Updater {
        Updater::new(Arc::clone(&self.access))
    }

    fn eraser(&self) -> Eraser {
        Eraser::new(Arc::clone(&self.access))
    }

    /// Physical collection name under `partition_key`
    pub fn collection_name(&self, partition_key: Option<&str>) -> String {
        self.access.collection_name::<D>(partition_key)
    }

    // --- create ---

    /// See [`Creator::add_one`]
    pub async fn add_one(&self, document: &mut D, cancel: Option<&CancellationToken>) -> Result<()> {
        self.creator().add_one(document, cancel).await
    }

    /// See [`Creator::add_many`]
    pub async fn add_many(&self, documents: &mut [D], cancel: Option<&CancellationToken>) -> Result<()> {
        self.creator().add_many(documents, cancel).await
    }

    // --- read ---

    /// See [`Reader::get_by_id`]
    pub async fn get_by_id(&self, id: &D::Key, scope: Scope<'_>) -> Result<Option<D>> {
        self.reader().get_by_id::<D>(id, scope).await
    }

    /// See [`Reader::get_one`]
    pub async fn get_one(&self, filter: &Filter, scope: Scope<'_>) -> Result<Option<D>> {
        self.reader().get_one::<D>(filter, scope).await
    }

    /// See [`Reader::get_all`]
    pub async fn get_all(&self, filter: &Filter, scope: Scope<'_>) -> Result<Vec<D>> {
        self.reader().get_all::<D>(filter, scope).await
    }

    /// See [`Reader::any`]
    pub async fn any(&self, filter: &Filter, scope: Scope<'_>) -> Result<bool> {
        self.reader().any::<D>(filter, scope).await
    }

    /// See [`Reader::count`]
    pub async fn count(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        self.reader().count::<D>(filter, scope).await
    }

    /// See [`Reader::get_by_max`]
    pub async fn get_by_max<V>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<Option<D>> {
        self.reader().get_by_max::<D, V>(filter, field, scope).await
    }

    /// See [`Reader::get_by_min`]
    pub async fn get_by_min<V>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<Option<D>> {
        self.reader().get_by_min::<D, V>(filter, field, scope).await
    }

    /// See [`Reader::get_max_value`]
    pub async fn get_max_value<V: DeserializeOwned>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        scope: Scope<'_>,
    ) -> Result<Option<V>> {
        self.reader().get_max_value::<D, V>(filter, field, scope).await
    }

    /// See [`Reader::get_min_value`]
    pub async fn get_min_value<V: DeserializeOwned>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        scope: Scope<'_>,
    ) -> Result<Option<V>> {
        self.reader().get_min_value::<D, V>(filter, field, scope).await
    }

    /// See [`Reader::sum_by`]
    pub async fn sum_by<V: DeserializeOwned>(&self, filter: &Filter, field: &Field<V>, scope: Scope<'_>) -> Result<V> {
        self.reader().sum_by::<D, V>(filter, field, scope).await
    }

    /// See [`Reader::project_one`]
    pub async fn project_one<P: DeserializeOwned>(
        &self,
        filter: &Filter,
        projection: &Projection,
        scope: Scope<'_>,
    ) -> Result<Option<P>> {
        self.reader().project_one::<D, P>(filter, projection, scope).await
    }

    /// See [`Reader::project_many`]
    pub async fn project_many<P: DeserializeOwned>(
        &self,
        filter: &Filter,
        projection: &Projection,
        scope: Scope<'_>,
    ) -> Result<Vec<P>> {
        self.reader().project_many::<D, P>(filter, projection, scope).await
    }

    /// See [`Reader::group_by`]
    pub async fn group_by<K, R, F>(&self, key: &Field<K>, project: F, scope: Scope<'_>) -> Result<Vec<R>>
    where
        K: DeserializeOwned,
        F: Fn(Grouping<K, D>) -> R,
    {
        self.reader().group_by::<D, K, R, F>(key, project, scope).await
    }

    /// See [`Reader::group_by_filtered`]
    pub async fn group_by_filtered<K, R, F>(
        &self,
        filter: &Filter,
        key: &Field<K>,
        project: F,
        scope: Scope<'_>,
    ) -> Result<Vec<R>>
    where
        K: DeserializeOwned,
        F: Fn(Grouping<K, D>) -> R,
    {
        self.reader()
            .group_by_filtered::<D, K, R, F>(filter, key, project, scope)
            .await
    }

    /// See [`Reader::get_sorted_paginated`]
    pub async fn get_sorted_paginated<V>(
        &self,
        filter: &Filter,
        sort_by: &Field<V>,
        ascending: bool,
        page: Page,
        scope: Scope<'_>,
    ) -> Result<Vec<D>> {
        self.reader()
            .get_sorted_paginated::<D, V>(filter, sort_by, ascending, page, scope)
            .await
    }

    /// See [`Reader::get_sorted_paginated_by`]
    pub async fn get_sorted_paginated_by(
        &self,
        filter: &Filter,
        sort: &SortDefinition,
        page: Page,
        scope: Scope<'_>,
    ) -> Result<Vec<D>> {
        self.reader()
            .get_sorted_paginated_by::<D>(filter, sort, page, scope)
            .await
    }

    /// First page using the configured default page size
    pub fn default_page(&self) -> Page {
        Page::first(self.access.config().default_page_size)
    }

    // --- update ---

    /// See [`Updater::update_one`]
    pub async fn update_one(&self, document: &D, cancel: Option<&CancellationToken>) -> Result<bool> {
        self.updater().update_one(document, cancel).await
    }

    /// See [`Updater::update_one_field`]
    pub async fn update_one_field<V: Serialize>(
        &self,
        document: &D,
        field: &Field<V>,
        value: V,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool> {
        self.updater()
            .update_one_field(document, field, value, cancel)
            .await
    }

    /// See [`Updater::update_one_definition`]
    pub async fn update_one_definition(
        &self,
        document: &D,
        update: &UpdateDefinition,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool> {
        self.updater()
            .update_one_definition(document, update, cancel)
            .await
    }

    /// See [`Updater::update_one_field_matching`]
    pub async fn update_one_field_matching<V: Serialize>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        value: V,
        scope: Scope<'_>,
    ) -> Result<bool> {
        self.updater()
            .update_one_field_matching::<D, V>(filter, field, value, scope)
            .await
    }

    /// See [`Updater::update_one_definition_matching`]
    pub async fn update_one_definition_matching(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        scope: Scope<'_>,
    ) -> Result<bool> {
        self.updater()
            .update_one_definition_matching::<D>(filter, update, scope)
            .await
    }

    /// See [`Updater::update_many`]
    pub async fn update_many(&self, documents: &[D], cancel: Option<&CancellationToken>) -> Result<u64> {
        self.updater().update_many(documents, cancel).await
    }

    /// See [`Updater::update_many_field_matching`]
    pub async fn update_many_field_matching<V: Serialize>(
        &self,
        filter: &Filter,
        field: &Field<V>,
        value: V,
        scope: Scope<'_>,
    ) -> Result<u64> {
        self.updater()
            .update_many_field_matching::<D, V>(filter, field, value, scope)
            .await
    }

    /// See [`Updater::update_many_definition_matching`]
    pub async fn update_many_definition_matching(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        scope: Scope<'_>,
    ) -> Result<u64> {
        self.updater()
            .update_many_definition_matching::<D>(filter, update, scope)
            .await
    }

    // --- delete ---

    /// See [`Eraser::delete_one`]
    pub async fn delete_one(&self, document: &D, cancel: Option<&CancellationToken>) -> Result<u64> {
        self.eraser().delete_one(document, cancel).await
    }

    /// See [`Eraser::delete_one_matching`]
    pub async fn delete_one_matching(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        self.eraser().delete_one_matching::<D>(filter, scope).await
    }

    /// See [`Eraser::delete_by_id`]
    pub async fn delete_by_id(&self, id: &D::Key, scope: Scope<'_>) -> Result<u64> {
        self.eraser().delete_by_id::<D>(id, scope).await
    }

    /// See [`Eraser::delete_many`]
    pub async fn delete_many(&self, documents: &[D], cancel: Option<&CancellationToken>) -> Result<u64> {
        self.eraser().delete_many(documents, cancel).await
    }

    /// See [`Eraser::delete_many_matching`]
    pub async fn delete_many_matching(&self, filter: &Filter, scope: Scope<'_>) -> Result<u64> {
        self.eraser().delete_many_matching::<D>(filter, scope).await
    }
}
