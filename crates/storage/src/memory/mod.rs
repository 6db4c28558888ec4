//! In-memory reference driver
//!
//! `MemoryClient` implements the database client collaborator entirely in
//! process. It backs the test suites and embedded use, and fixes the
//! semantics every other driver is expected to match:
//!
//! - Collections are created on first request and never duplicated
//! - `_id` is unique per collection; unique indexes are enforced on write
//! - Finds return documents in natural (insertion) order unless sorted,
//!   and sorting is stable
//! - A cancelled token fails the call before it touches data

mod client;
mod collection;
pub mod eval;

pub use client::MemoryClient;
pub use collection::MemoryCollection;
