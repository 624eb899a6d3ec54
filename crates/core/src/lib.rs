//! Core types and shared functionality for stashd.
//!
//! This crate provides:
//! - Versioned cache storage with SQLite backend
//! - Request/response model with single-read bodies
//! - The cache policy engine and the worker lifecycle around it
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod worker;

pub use cache::{CacheDb, CacheEntry, CacheStorage};
pub use config::{AppConfig, StrategyKind};
pub use error::Error;
pub use http::{Destination, Fetcher, Request, RequestMode, Response, ResponseType};
pub use worker::{Event, EventOutcome, FetchOutcome, LocalHost, ResponseSource, ServiceWorker};
