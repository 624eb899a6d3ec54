//! stashd server entry point.
//!
//! Loads configuration, opens the cache database, and boots the MCP server
//! on stdio transport. Pending cache write-backs are awaited before exit.
//! Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use stashd_client::{FetchClient, FetchConfig};
use stashd_core::{AppConfig, CacheDb, Fetcher, LocalHost, ServiceWorker};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(
        cache = %config.cache_name,
        strategy = config.strategy.as_str(),
        db = %config.db_path.display(),
        "Starting stashd server on stdio transport"
    );

    let store = Arc::new(CacheDb::open(&config.db_path).await?);
    let fetcher = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config))?);
    let worker = Arc::new(ServiceWorker::new(&config, store, fetcher, Arc::new(LocalHost::new()))?);

    let handler = handler::StashdServer::new(Arc::clone(&worker), config.origin_url()?);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    drain(&worker).await;

    Ok(())
}

/// Wait for cache write-backs still in flight once the transport is gone.
async fn drain<F: Fetcher + 'static>(worker: &tools::Worker<F>) {
    tracing::info!(cache = %worker.engine().cache_name(), "transport closed, flushing pending cache writes");
    worker.engine().settle().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fetch::{SwFetchParams, default_method, fetch_impl};
    use crate::tools::testing::worker;
    use stashd_core::CacheStorage;

    #[tokio::test]
    async fn test_drain_commits_pending_write_backs() {
        let (worker, fetcher) = worker().await;
        fetcher.serve("https://ata.example.org/app.js", 200, "console.log(1)");
        let origin = url::Url::parse("https://ata.example.org/").unwrap();
        let params = SwFetchParams { url: "./app.js".into(), method: default_method(), mode: None, destination: None };

        fetch_impl(&worker, &origin, params).await.unwrap();
        drain(&worker).await;

        let engine = worker.engine();
        let urls = engine.store().entry_urls(engine.cache_name()).await.unwrap();
        assert_eq!(urls, vec!["https://ata.example.org/app.js"]);
    }
}
