//! Database layer for vectorscout
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - The [`RecordStore`] trait used by scouting sessions
//! - A repository implementation over a single connection

pub mod repo;
pub mod schema;

pub use repo::{Database, RecordStore};
