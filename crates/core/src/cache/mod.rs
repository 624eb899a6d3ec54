//! SQLite-backed cache storage for versioned namespaces.
//!
//! This module provides a persistent request/response cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Request identity keys using SHA-256 hashing
//! - Named, versioned namespaces with cascading deletes
//! - Atomic single and bulk puts
//! - Automatic schema migrations
//! - Maintenance purges (domain, LRU)

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod namespaces;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use storage::CacheStorage;
