//! Partitioned document repository engine
//!
//! This crate sits between callers and a [`DatabaseClient`]:
//! - CollectionResolver: `(document type, partition key)` to a cached collection handle
//! - DataAccess: the shared base every facade routes through
//! - Creator / Reader / Updater / Eraser: the CRUD surface
//! - IndexManager: index lifecycle with deterministic names
//! - Repository / DocumentRepository: async facades
//! - blocking: synchronous facades
//! - RepositoryConfig: `docrepo.toml`
//!
//! No subscriber is installed here; events are emitted through `tracing`.
//!
//! [`DatabaseClient`]: docrepo_storage::DatabaseClient

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access;
pub mod blocking;
pub mod config;
pub mod creator;
pub mod eraser;
pub mod index_manager;
pub mod reader;
pub mod repository;
pub mod resolver;
pub mod updater;

#[cfg(test)]
pub(crate) mod testing;

pub use access::DataAccess;
pub use config::{RepositoryConfig, CONFIG_FILE_NAME};
pub use creator::Creator;
pub use eraser::Eraser;
pub use index_manager::IndexManager;
pub use reader::Reader;
pub use repository::{DocumentRepository, Repository};
pub use resolver::{CollectionHandle, CollectionResolver};
pub use updater::Updater;
