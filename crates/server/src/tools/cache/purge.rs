//! cache_purge tool implementation.
//!
//! Purges entries from a namespace by domain or count, or drops the
//! namespace outright.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stashd_core::CacheDb;

use crate::error::ToolError;
use crate::tools::json_output;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Namespace to purge (default: the current cache).
    #[serde(default)]
    pub namespace: Option<String>,

    /// Purge entries whose URL matches this domain pattern.
    pub domain: Option<String>,

    /// Keep only the newest N entries (LRU purge).
    pub max_entries: Option<usize>,

    /// Delete the whole namespace.
    #[serde(default)]
    pub drop_namespace: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub namespace: String,
    /// Number of entries deleted.
    pub deleted: u64,
    /// Whether the namespace itself was removed.
    pub dropped: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, current: &str, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.domain.is_none() && params.max_entries.is_none() && !params.drop_namespace {
        return Err(
            ToolError::InvalidInput("At least one of domain, max_entries, or drop_namespace must be specified".into())
                .into(),
        );
    }

    let namespace = params.namespace.unwrap_or_else(|| current.to_string());
    let mut deleted_total = 0u64;

    if params.drop_namespace {
        deleted_total += cache.entry_urls(&namespace).await?.len() as u64;
        let dropped = cache.delete_namespace(&namespace).await?;
        tracing::info!(cache = %namespace, dropped, "namespace purged");
        return json_output(&CachePurgeOutput { namespace, deleted: deleted_total, dropped });
    }

    if let Some(domain) = params.domain {
        deleted_total += cache.purge_entries_by_domain(&namespace, &domain).await?;
    }

    if let Some(max_entries) = params.max_entries {
        deleted_total += cache.purge_lru_entries(&namespace, max_entries).await?;
    }

    tracing::info!(cache = %namespace, deleted = deleted_total, "entries purged");
    json_output(&CachePurgeOutput { namespace, deleted: deleted_total, dropped: false })
}
