//! The cache storage interface injected into the policy engine.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::CacheEntry;
use crate::Error;

/// Store handle with the lifecycle the cache policy relies on:
/// open-or-create, lookup, put, delete and key listing.
///
/// Individual puts must be atomic; `put_all` must commit all entries or
/// none.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the namespace if needed.
    async fn open(&self, namespace: &str) -> Result<(), Error>;

    async fn has(&self, namespace: &str) -> Result<bool, Error>;

    /// Names of every namespace.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a namespace; `Ok(false)` if it did not exist.
    async fn delete(&self, namespace: &str) -> Result<bool, Error>;

    async fn match_entry(&self, namespace: &str, request_key: &str) -> Result<Option<CacheEntry>, Error>;

    async fn put(&self, namespace: &str, entry: &CacheEntry) -> Result<(), Error>;

    async fn put_all(&self, namespace: &str, entries: &[CacheEntry]) -> Result<(), Error>;

    /// URLs stored in a namespace.
    async fn entry_urls(&self, namespace: &str) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        self.open_namespace(namespace).await
    }

    async fn has(&self, namespace: &str) -> Result<bool, Error> {
        self.has_namespace(namespace).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.namespace_names().await
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        self.delete_namespace(namespace).await
    }

    async fn match_entry(&self, namespace: &str, request_key: &str) -> Result<Option<CacheEntry>, Error> {
        self.get_entry(namespace, request_key).await
    }

    async fn put(&self, namespace: &str, entry: &CacheEntry) -> Result<(), Error> {
        self.put_entry(namespace, entry).await
    }

    async fn put_all(&self, namespace: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        self.put_entries(namespace, entries).await
    }

    async fn entry_urls(&self, namespace: &str) -> Result<Vec<String>, Error> {
        CacheDb::entry_urls(self, namespace).await
    }
}
