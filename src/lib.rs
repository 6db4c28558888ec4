//! docrepo - generic partitioned document repository
//!
//! A typed data-access layer over a schemaless document database. Callers
//! get create/read/update/delete, projection, grouping, pagination,
//! aggregation and index management for any [`Document`] type, while
//! partitioned types are routed transparently into one physical collection
//! per partition key.
//!
//! # Quick Start
//!
//! ```
//! use docrepo::{Document, Field, Filter, Repository, RepositoryConfig, Scope, Uuid};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Invoice {
//!     #[serde(rename = "_id")]
//!     id: Uuid,
//!     tenant: String,
//!     amount: i64,
//! }
//!
//! impl Document for Invoice {
//!     type Key = Uuid;
//!     const PARTITIONED: bool = true;
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn set_id(&mut self, id: Uuid) { self.id = id; }
//!     fn partition_key(&self) -> Option<&str> { Some(&self.tenant) }
//! }
//!
//! const AMOUNT: Field<i64> = Field::new("amount");
//!
//! let repo = docrepo::blocking::Repository::in_memory(RepositoryConfig::default()).unwrap();
//! let invoices = repo.documents::<Invoice>();
//!
//! let mut invoice = Invoice { id: Uuid::nil(), tenant: "acme".into(), amount: 120 };
//! invoices.add_one(&mut invoice, None).unwrap();
//!
//! let total = invoices.sum_by(&Filter::all(), &AMOUNT, Scope::partition("acme")).unwrap();
//! assert_eq!(total, 120);
//! # let _ = Repository::in_memory(RepositoryConfig::default());
//! ```
//!
//! # Architecture
//!
//! - `docrepo-core`: documents, keys, expressions, errors
//! - `docrepo-storage`: the database client boundary and an in-memory driver
//! - `docrepo-engine`: collection resolution, the CRUD facades, configuration

pub use docrepo_core::*;
pub use docrepo_engine::{
    blocking, CollectionHandle, CollectionResolver, Creator, DataAccess, DocumentRepository,
    Eraser, IndexManager, Reader, Repository, RepositoryConfig, Updater, CONFIG_FILE_NAME,
};
pub use docrepo_storage::{CollectionDriver, DatabaseClient, MemoryClient, MemoryCollection};
