//! Core types and traits for docrepo
//!
//! This crate defines the foundational types used throughout the system:
//! - Document / DocumentKey: what can be stored and how it is identified
//! - KeyGenerator: per-key-type generation strategy table
//! - Query expressions: Filter, Field, SortDefinition, Projection, UpdateDefinition
//! - Index model and deterministic index naming
//! - Scope: partition key + cancellation token of one call
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod index;
pub mod key;
pub mod query;
pub mod scope;

pub use document::{
    field_value, from_stored, key_to_stored, routing_partition, short_type_name, to_stored,
    Document, ID_FIELD,
};
pub use error::{DriverError, DriverResult, Error, Result};
pub use index::{IndexKind, IndexModel, IndexOptions, ID_INDEX_NAME};
pub use key::{DocumentKey, KeyGenerator, KeyStrategy};
pub use query::{
    Field, Filter, FindOptions, Grouping, Page, Projection, SortDefinition, SortDirection,
    StoredGroup, UpdateDefinition, UpdateOp, UpdateResult, DEFAULT_PAGE_SIZE,
};
pub use scope::Scope;

pub use bson::oid::ObjectId;
pub use serde_json::Value as JsonValue;
pub use tokio_util::sync::CancellationToken;
pub use uuid::Uuid;
