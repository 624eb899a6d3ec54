//! Network client for stashd.
//!
//! This crate provides the HTTP fetch pipeline the cache policy engine uses
//! to reach the network, plus URL resolution for intercepted requests.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, content_type, is_fetchable, require_fetchable, resolve};
