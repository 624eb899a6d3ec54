//! The cache policy engine.
//!
//! Owns one versioned namespace in an injected [`CacheStorage`], seeds it
//! at install, prunes every other namespace at activation, and answers
//! intercepted requests with one of the retrieval strategies:
//!
//! | class         | strategy                                     |
//! |---------------|----------------------------------------------|
//! | `FontHost`    | network-first, cache fallback                |
//! | `Navigation`  | network-first, offline document fallback     |
//! | `Generic`     | cache-first, store 200 basic/cors responses  |
//! | `CacheFirst`  | stale-while-revalidate                       |
//!
//! Write-backs run as detached tasks on a [`TaskTracker`]. They own a
//! clone of the response taken before the caller's copy is read, and
//! their failures are logged and dropped.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio_util::task::TaskTracker;
use url::Url;

use super::classify::{RequestClass, classify};
use crate::Error;
use crate::cache::{CacheEntry, CacheStorage};
use crate::config::{AppConfig, ConfigError, StrategyKind};
use crate::http::{Destination, Fetcher, Request, Response, ResponseType};

/// Where the response handed back to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The precached offline document, served in place of a navigation.
    Offline,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
        }
    }
}

/// Result of handling an intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The engine did not intervene; the default network path applies.
    Bypass,
    Respond { response: Response, source: ResponseSource },
}

impl FetchOutcome {
    fn network(response: Response) -> Self {
        FetchOutcome::Respond { response, source: ResponseSource::Network }
    }

    fn cache(response: Response) -> Self {
        FetchOutcome::Respond { response, source: ResponseSource::Cache }
    }
}

/// Engine settings derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub cache_name: String,
    pub offline_url: Url,
    pub font_hosts: Vec<String>,
    pub strategy: StrategyKind,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            cache_name: config.cache_name.clone(),
            offline_url: config.offline_document()?,
            font_hosts: config.font_hosts.clone(),
            strategy: config.strategy,
        })
    }
}

/// Cache policy engine over an injected store and network.
pub struct CachePolicyEngine<S, F> {
    store: Arc<S>,
    fetcher: Arc<F>,
    settings: EngineSettings,
    tasks: TaskTracker,
}

impl<S, F> CachePolicyEngine<S, F>
where
    S: CacheStorage + 'static,
    F: Fetcher + 'static,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>, settings: EngineSettings) -> Self {
        Self { store, fetcher, settings, tasks: TaskTracker::new() }
    }

    pub fn cache_name(&self) -> &str {
        &self.settings.cache_name
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Seed the current namespace with the precache set.
    ///
    /// All URLs are fetched concurrently and must answer with a 2xx status.
    /// The entries are committed in one `put_all`, so a single failure
    /// leaves nothing from this install behind. Returns the number of
    /// entries stored.
    pub async fn install(&self, precache: &[Url]) -> Result<usize, Error> {
        self.store.open(&self.settings.cache_name).await?;

        let entries = try_join_all(precache.iter().map(|url| self.precache_one(url))).await?;

        self.store.put_all(&self.settings.cache_name, &entries).await?;
        tracing::info!(cache = %self.settings.cache_name, entries = entries.len(), "precache complete");

        Ok(entries.len())
    }

    async fn precache_one(&self, url: &Url) -> Result<CacheEntry, Error> {
        let failed = |reason: String| Error::PrecacheFailed { url: url.to_string(), reason };

        let request = Request::get(url.as_str())?;
        let response = self.fetcher.fetch(&request).await.map_err(|e| failed(e.to_string()))?;
        if !response.ok() {
            return Err(failed(format!("status {}", response.status)));
        }
        CacheEntry::capture(&request, response)
    }

    /// Delete every namespace except the current one.
    ///
    /// Returns the deleted names. Running it again deletes nothing.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.store.keys().await? {
            if name == self.settings.cache_name {
                continue;
            }
            tracing::info!(cache = %name, "removing stale cache");
            if self.store.delete(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Produce the response for an intercepted request.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        let class = classify(&request, self.settings.strategy, &self.settings.font_hosts);
        tracing::debug!(url = %request.url, ?class, "intercepted request");

        match class {
            RequestClass::Bypass => Ok(FetchOutcome::Bypass),
            RequestClass::FontHost => self.network_first_with_cache(request).await,
            RequestClass::Navigation => self.network_first_with_offline(request).await,
            RequestClass::Generic => self.cache_first(request).await,
            RequestClass::CacheFirst => self.stale_while_revalidate(request).await,
        }
    }

    async fn network_first_with_cache(&self, request: Request) -> Result<FetchOutcome, Error> {
        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                self.write_back_if(&request, &response, is_cacheable(&response))?;
                Ok(FetchOutcome::network(response))
            }
            Err(err) if err.is_network_failure() => {
                tracing::debug!(url = %request.url, error = %err, "network failed, trying cache");
                match self.lookup(&request).await {
                    Some(cached) => Ok(FetchOutcome::cache(cached)),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn network_first_with_offline(&self, request: Request) -> Result<FetchOutcome, Error> {
        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                self.write_back_if(&request, &response, is_cacheable(&response))?;
                Ok(FetchOutcome::network(response))
            }
            Err(err) if err.is_network_failure() => {
                tracing::debug!(url = %request.url, error = %err, "navigation offline, serving fallback");
                self.offline_document().await
            }
            Err(err) => Err(err),
        }
    }

    async fn cache_first(&self, request: Request) -> Result<FetchOutcome, Error> {
        if let Some(cached) = self.lookup(&request).await {
            return Ok(FetchOutcome::cache(cached));
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                let storable =
                    response.status == 200 && matches!(response.kind, ResponseType::Basic | ResponseType::Cors);
                self.write_back_if(&request, &response, storable)?;
                Ok(FetchOutcome::network(response))
            }
            Err(err) if err.is_network_failure() && request.is_navigation() => self.offline_document().await,
            Err(err) => Err(err),
        }
    }

    async fn stale_while_revalidate(&self, request: Request) -> Result<FetchOutcome, Error> {
        if let Some(cached) = self.lookup(&request).await {
            self.spawn_revalidate(request);
            return Ok(FetchOutcome::cache(cached));
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                self.write_back_if(&request, &response, is_cacheable(&response))?;
                Ok(FetchOutcome::network(response))
            }
            Err(err) if err.is_network_failure() && request.destination == Destination::Document => {
                self.offline_document().await
            }
            Err(err) => Err(err),
        }
    }

    /// Look up the request in the current namespace.
    ///
    /// Read failures count as misses.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        if !request.is_get() {
            return None;
        }
        match self
            .store
            .match_entry(&self.settings.cache_name, &request.cache_key())
            .await
        {
            Ok(entry) => entry.map(CacheEntry::into_response),
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "cache lookup failed");
                None
            }
        }
    }

    async fn offline_document(&self) -> Result<FetchOutcome, Error> {
        let request = Request::navigate(self.settings.offline_url.as_str())?;
        match self.lookup(&request).await {
            Some(response) => Ok(FetchOutcome::Respond { response, source: ResponseSource::Offline }),
            None => Err(Error::OfflineFallbackMissing(self.settings.offline_url.to_string())),
        }
    }

    /// Clone `response` and persist the clone in the background.
    ///
    /// Must run before anyone reads the caller's copy.
    fn write_back_if(&self, request: &Request, response: &Response, storable: bool) -> Result<(), Error> {
        if !storable || !request.is_get() {
            return Ok(());
        }
        let copy = response.try_clone()?;
        self.spawn_put(request.clone(), copy);
        Ok(())
    }

    fn spawn_put(&self, request: Request, response: Response) {
        let store = self.store.clone();
        let cache_name = self.settings.cache_name.clone();
        self.tasks.spawn(async move {
            let result = match CacheEntry::capture(&request, response) {
                Ok(entry) => store.put(&cache_name, &entry).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                tracing::warn!(url = %request.url, error = %err, "cache write-back failed");
            }
        });
    }

    fn spawn_revalidate(&self, request: Request) {
        if !request.is_get() {
            return;
        }
        let store = self.store.clone();
        let fetcher = self.fetcher.clone();
        let cache_name = self.settings.cache_name.clone();
        self.tasks.spawn(async move {
            let result = async {
                let response = fetcher.fetch(&request).await?;
                if response.status != 200 {
                    return Ok(false);
                }
                let entry = CacheEntry::capture(&request, response)?;
                store.put(&cache_name, &entry).await?;
                Ok::<_, Error>(true)
            }
            .await;

            match result {
                Ok(refreshed) => tracing::debug!(url = %request.url, refreshed, "revalidation finished"),
                Err(err) => tracing::debug!(url = %request.url, error = %err, "revalidation failed"),
            }
        });
    }

    /// Wait for every in-flight write-back and revalidation to finish.
    pub async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

/// A 200 response that is not a network-error placeholder.
fn is_cacheable(response: &Response) -> bool {
    response.status == 200 && response.kind != ResponseType::Error
}
