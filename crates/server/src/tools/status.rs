//! sw_status tool implementation.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use stashd_core::worker::HostRecord;
use stashd_core::{CacheStorage, Fetcher};

use super::{Worker, json_output};

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub state: String,
    pub cache_name: String,
    pub strategy: String,
    /// Every namespace in storage, in creation order.
    pub namespaces: Vec<String>,
    /// Entries in the current namespace.
    pub entries: usize,
    pub sync_tags: Vec<String>,
    /// What the host has been asked to do so far.
    pub host: HostRecord,
}

/// Implementation of the sw_status tool.
pub async fn status_impl<F: Fetcher + 'static>(worker: &Arc<Worker<F>>) -> Result<CallToolResult, McpError> {
    let engine = worker.engine();
    let store = engine.store();

    let entries = if store.has(engine.cache_name()).await? {
        store.entry_urls(engine.cache_name()).await?.len()
    } else {
        0
    };

    let output = StatusOutput {
        state: worker.state().await.to_string(),
        cache_name: engine.cache_name().to_string(),
        strategy: engine.settings().strategy.as_str().to_string(),
        namespaces: store.keys().await?,
        entries,
        sync_tags: worker
            .sync_registry()
            .tags()
            .into_iter()
            .map(str::to_string)
            .collect(),
        host: worker.host().snapshot().await,
    };
    json_output(&output)
}
