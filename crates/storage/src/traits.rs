//! Database client collaborator boundary
//!
//! The repository engine talks to the document database only through these
//! two traits. Expressions ([`Filter`], [`FindOptions`], [`UpdateDefinition`],
//! [`IndexModel`]) are passed through unmodified and results come back in
//! stored (JSON) form. Cancellation tokens are forwarded as received.
//!
//! Thread safety: implementations must be safe to call concurrently from
//! many tasks (`Send + Sync`).

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use docrepo_core::{
    CancellationToken, DriverResult, Filter, FindOptions, IndexModel, JsonValue, StoredGroup,
    UpdateDefinition, UpdateResult,
};

/// Entry point of a database connection
#[async_trait]
pub trait DatabaseClient: Send + Sync + Debug {
    /// Name of the database this client is bound to
    fn database_name(&self) -> &str;

    /// Obtain the named collection, creating it on first use
    ///
    /// Idempotent: concurrent callers asking for the same name receive
    /// handles onto the same physical collection. Never mutates data.
    async fn collection(&self, name: &str) -> DriverResult<Arc<dyn CollectionDriver>>;

    /// Names of all existing collections, sorted
    async fn list_collection_names(&self) -> DriverResult<Vec<String>>;

    /// Drop the named collection with its documents and indexes
    ///
    /// Handles obtained earlier must keep addressing the collection of that
    /// name: they see it empty, and a write through them recreates it.
    /// Returns `false` if no such collection existed.
    async fn drop_collection(&self, name: &str) -> DriverResult<bool>;
}

/// Operations against one physical collection
#[async_trait]
pub trait CollectionDriver: Send + Sync + Debug {
    /// Physical collection name
    fn name(&self) -> &str;

    /// Insert one document
    async fn insert_one(
        &self,
        document: JsonValue,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<()>;

    /// Insert documents in order
    async fn insert_many(
        &self,
        documents: Vec<JsonValue>,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<()>;

    /// Matching documents, shaped by `options`
    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<Vec<JsonValue>>;

    /// Number of matching documents, stopping at `limit` when given
    async fn count(
        &self,
        filter: &Filter,
        limit: Option<u64>,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<u64>;

    /// Replace the first matching document
    async fn replace_one(
        &self,
        filter: &Filter,
        replacement: JsonValue,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<UpdateResult>;

    /// Apply `update` to the first matching document
    async fn update_one(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<UpdateResult>;

    /// Apply `update` to every matching document
    async fn update_many(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<UpdateResult>;

    /// Delete the first matching document, returning the deleted count
    async fn delete_one(
        &self,
        filter: &Filter,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<u64>;

    /// Delete every matching document, returning the deleted count
    async fn delete_many(
        &self,
        filter: &Filter,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<u64>;

    /// Sum of `field` over matching documents
    async fn sum(
        &self,
        filter: &Filter,
        field: &str,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<JsonValue>;

    /// Matching documents grouped by the value of `field`
    async fn group(
        &self,
        filter: &Filter,
        field: &str,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<Vec<StoredGroup>>;

    /// Create an index, returning its name
    async fn create_index(
        &self,
        model: IndexModel,
        cancel: Option<&CancellationToken>,
    ) -> DriverResult<String>;

    /// Names of all indexes, the primary-key index first
    async fn list_index_names(&self, cancel: Option<&CancellationToken>)
        -> DriverResult<Vec<String>>;

    /// Drop the named index
    async fn drop_index(&self, name: &str, cancel: Option<&CancellationToken>)
        -> DriverResult<()>;
}
