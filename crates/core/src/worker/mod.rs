//! The offline caching agent.
//!
//! [`ServiceWorker`] ties the cache policy engine to its lifecycle and to
//! the auxiliary handlers:
//!
//! - `install`: precache the asset set, then skip waiting
//! - `activate`: delete stale namespaces, then claim clients
//! - `fetch`: classify and answer intercepted requests
//! - `push`: show a notification
//! - `sync`: run a background sync routine by tag
//! - `notificationclick`: close, then optionally open the app
//!
//! Events reach it through [`dispatch`](ServiceWorker::dispatch), which runs
//! each handler as its own task.

pub mod classify;
pub mod dispatch;
pub mod engine;
pub mod host;
pub mod lifecycle;
pub mod notify;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{RequestClass, classify};
pub use dispatch::{Completion, Event, EventOutcome};
pub use engine::{CachePolicyEngine, EngineSettings, FetchOutcome, ResponseSource};
pub use host::{Host, HostRecord, LocalHost};
pub use lifecycle::WorkerState;
pub use notify::{ClickRoute, Notification, build_notification, route_click};
pub use sync::SyncRegistry;

use std::sync::Arc;

use tokio::sync::RwLock;
use url::Url;

use crate::Error;
use crate::cache::CacheStorage;
use crate::config::{AppConfig, NotificationConfig};
use crate::http::{Fetcher, Request};

/// The agent: policy engine plus lifecycle, notifications and sync.
pub struct ServiceWorker<S, F, H> {
    engine: CachePolicyEngine<S, F>,
    host: Arc<H>,
    precache: Vec<Url>,
    root_url: Url,
    notification: NotificationConfig,
    sync: SyncRegistry,
    state: RwLock<WorkerState>,
}

impl<S, F, H> ServiceWorker<S, F, H>
where
    S: CacheStorage + 'static,
    F: Fetcher + 'static,
    H: Host + 'static,
{
    /// Build a worker from validated configuration.
    pub fn new(config: &AppConfig, store: Arc<S>, fetcher: Arc<F>, host: Arc<H>) -> Result<Self, Error> {
        let invalid = |e: crate::config::ConfigError| Error::InvalidInput(e.to_string());

        let settings = EngineSettings::from_config(config).map_err(invalid)?;
        Ok(Self {
            engine: CachePolicyEngine::new(store, fetcher, settings),
            host,
            precache: config.precache_set().map_err(invalid)?,
            root_url: config.resolve("./").map_err(invalid)?,
            notification: config.notification.clone(),
            sync: SyncRegistry::with_study_data(&config.sync_tags),
            state: RwLock::new(WorkerState::Parsed),
        })
    }

    pub fn engine(&self) -> &CachePolicyEngine<S, F> {
        &self.engine
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn sync_registry(&self) -> &SyncRegistry {
        &self.sync
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Move into a transitional state if `allowed` accepts the current one.
    async fn enter(&self, allowed: fn(WorkerState) -> bool, next: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !allowed(*state) {
            return Err(Error::WorkerState(format!("cannot move from {} to {}", *state, next)));
        }
        *state = next;
        Ok(())
    }

    async fn set_state(&self, next: WorkerState) {
        *self.state.write().await = next;
    }

    /// Precache the asset set and request immediate activation.
    ///
    /// On failure nothing is committed, the worker becomes redundant and the
    /// error is returned. There is no retry.
    pub async fn install(&self) -> Result<usize, Error> {
        self.enter(WorkerState::can_install, WorkerState::Installing).await?;
        tracing::info!(cache = %self.engine.cache_name(), "installing");

        let result = async {
            let count = self.engine.install(&self.precache).await?;
            self.host.skip_waiting().await?;
            Ok::<_, Error>(count)
        }
        .await;

        match result {
            Ok(count) => {
                self.set_state(WorkerState::Installed).await;
                Ok(count)
            }
            Err(err) => {
                tracing::error!(cache = %self.engine.cache_name(), error = %err, "install failed");
                self.set_state(WorkerState::Redundant).await;
                Err(err)
            }
        }
    }

    /// Prune stale namespaces and take control of open clients.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.enter(WorkerState::can_activate, WorkerState::Activating).await?;
        tracing::info!(cache = %self.engine.cache_name(), "activating");

        let result = async {
            let deleted = self.engine.activate().await?;
            let claimed = self.host.claim_clients().await?;
            tracing::debug!(claimed, "claimed clients");
            Ok::<_, Error>(deleted)
        }
        .await;

        match result {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated).await;
                Ok(deleted)
            }
            Err(err) => {
                tracing::error!(cache = %self.engine.cache_name(), error = %err, "activation failed");
                self.set_state(WorkerState::Redundant).await;
                Err(err)
            }
        }
    }

    pub async fn fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        self.engine.handle_fetch(request).await
    }

    /// Show the notification for a push message.
    pub async fn push(&self, payload: Option<String>) -> Result<Notification, Error> {
        let notification = build_notification(&self.notification, payload.as_deref());
        self.host.show_notification(notification.clone()).await?;
        Ok(notification)
    }

    pub async fn sync(&self, tag: &str) -> Result<bool, Error> {
        tracing::info!(tag, "background sync");
        self.sync.dispatch(tag).await
    }

    /// Close the clicked notification and route the action.
    pub async fn notification_click(&self, action: Option<&str>, tag: Option<&str>) -> Result<ClickRoute, Error> {
        self.host
            .close_notification(tag.unwrap_or(&self.notification.tag))
            .await?;

        let route = route_click(action);
        if route == ClickRoute::OpenApp {
            self.host.open_window(&self.root_url).await?;
        }
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use crate::worker::testing::ScriptedFetcher;

    fn config() -> AppConfig {
        AppConfig {
            origin: "https://ata.example.org/".into(),
            precache_urls: vec!["./".into(), "./index.html".into()],
            cache_name: "ata-v6".into(),
            ..Default::default()
        }
    }

    async fn worker() -> (ServiceWorker<CacheDb, ScriptedFetcher, LocalHost>, Arc<CacheDb>, Arc<ScriptedFetcher>) {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.ok("https://ata.example.org/", "root");
        fetcher.ok("https://ata.example.org/index.html", "shell");
        let worker = ServiceWorker::new(&config(), store.clone(), fetcher.clone(), Arc::new(LocalHost::new())).unwrap();
        (worker, store, fetcher)
    }

    #[tokio::test]
    async fn test_install_then_activate() {
        let (worker, store, _fetcher) = worker().await;
        store.open_namespace("ata-v5").await.unwrap();
        worker.host().connect_client().await;

        assert_eq!(worker.install().await.unwrap(), 2);
        assert_eq!(worker.state().await, WorkerState::Installed);
        assert!(worker.host().snapshot().await.skip_waiting);

        assert_eq!(worker.activate().await.unwrap(), vec!["ata-v5"]);
        assert_eq!(worker.state().await, WorkerState::Activated);
        assert_eq!(worker.host().snapshot().await.controlled_clients, 1);

        assert!(worker.activate().await.unwrap().is_empty());
        assert_eq!(store.namespace_names().await.unwrap(), vec!["ata-v6"]);
    }

    #[tokio::test]
    async fn test_failed_install_is_redundant() {
        let (worker, _store, fetcher) = worker().await;
        fetcher.offline("https://ata.example.org/index.html");

        assert!(matches!(worker.install().await, Err(Error::PrecacheFailed { .. })));
        assert_eq!(worker.state().await, WorkerState::Redundant);
        assert!(!worker.host().snapshot().await.skip_waiting);
        assert!(matches!(worker.activate().await, Err(Error::WorkerState(_))));
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let (worker, _store, _fetcher) = worker().await;
        assert!(matches!(worker.activate().await, Err(Error::WorkerState(_))));
        assert_eq!(worker.state().await, WorkerState::Parsed);
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let (worker, _store, _fetcher) = worker().await;

        let shown = worker.push(Some("Revisão de hoje".into())).await.unwrap();

        assert_eq!(shown.body, "Revisão de hoje");
        assert_eq!(worker.host().snapshot().await.notifications, vec![shown]);
    }

    #[tokio::test]
    async fn test_click_open_focuses_root() {
        let (worker, _store, _fetcher) = worker().await;
        worker.push(None).await.unwrap();

        let route = worker.notification_click(Some("open"), None).await.unwrap();

        assert_eq!(route, ClickRoute::OpenApp);
        let record = worker.host().snapshot().await;
        assert!(record.notifications.is_empty());
        assert_eq!(record.windows, vec!["https://ata.example.org/"]);
    }

    #[tokio::test]
    async fn test_click_other_action_only_closes() {
        let (worker, _store, _fetcher) = worker().await;
        worker.push(None).await.unwrap();

        let route = worker.notification_click(Some("later"), Some("study-reminder")).await.unwrap();

        assert_eq!(route, ClickRoute::Close);
        let record = worker.host().snapshot().await;
        assert!(record.notifications.is_empty());
        assert!(record.windows.is_empty());
    }

    #[tokio::test]
    async fn test_sync_tags() {
        let (worker, _store, _fetcher) = worker().await;
        assert!(worker.sync("sync-study-data").await.unwrap());
        assert!(!worker.sync("unknown").await.unwrap());
    }
}
