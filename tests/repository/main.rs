//! Repository integration tests
//!
//! End-to-end behaviour of the facades over the in-memory driver.

#[path = "../common/mod.rs"]
mod common;

mod blocking_api;
mod config;
mod creator;
mod eraser;
mod partitions;
mod reader;
mod updater;
