//! Storage layer for docrepo
//!
//! This crate defines the boundary between the repository engine and the
//! document database:
//! - DatabaseClient: obtain-or-create collections, list and drop them
//! - CollectionDriver: find/insert/update/delete/aggregate/index operations
//!   against one physical collection
//!
//! It also ships `MemoryClient`, an in-process implementation used by the
//! test suites and for embedded use.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod traits;

pub use memory::{MemoryClient, MemoryCollection};
pub use traits::{CollectionDriver, DatabaseClient};
