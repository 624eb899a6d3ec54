//! cache_keys tool implementation.
//!
//! Lists the request URLs stored in a namespace.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stashd_core::CacheDb;

use crate::tools::json_output;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Namespace to list (default: the current cache).
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub namespace: String,
    /// Whether the namespace exists at all.
    pub exists: bool,
    /// Stored request URLs, oldest first.
    pub urls: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb, current: &str, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let namespace = params.namespace.unwrap_or_else(|| current.to_string());

    let exists = cache.has_namespace(&namespace).await?;
    let urls = if exists { cache.entry_urls(&namespace).await? } else { Vec::new() };

    json_output(&CacheKeysOutput { namespace, exists, urls })
}
