//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and trimming cache namespaces.

pub mod keys;
pub mod purge;

pub use keys::{CacheKeysParams, keys_impl};
pub use purge::{CachePurgeParams, purge_impl};
