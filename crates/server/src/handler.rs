//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use stashd_client::FetchClient;
use url::Url;

use crate::tools::{
    Worker,
    cache::{CacheKeysParams, CachePurgeParams, keys_impl, purge_impl},
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl},
    signals::{
        SwNotificationClickParams, SwPushParams, SwSyncParams, notification_click_impl, push_impl, sync_impl,
    },
    status::status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for stashd.
#[derive(Clone)]
pub struct StashdServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<Worker<FetchClient>>,
    /// Base for relative request URLs.
    origin: Url,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl StashdServer {
    /// Create a new server handler around a running worker.
    pub fn new(worker: Arc<Worker<FetchClient>>, origin: Url) -> Self {
        Self { tool_router: Self::tool_router(), worker, origin }
    }

    #[tool(description = "Install the worker: precache the application shell into the current cache namespace.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate the worker: delete stale cache namespaces and claim open clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Route a request through the cache policy.
    ///
    /// Returns the response the page would receive and where it came from
    /// (network, cache or the offline document).
    #[tool(
        description = "Send a request through the worker's cache policy. Returns status, headers, body and whether it came from network, cache or the offline fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, &self.origin, params.0).await
    }

    #[tool(description = "Deliver a push message. Shows the study reminder notification with the payload as its body.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync event for a tag.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a notification. The 'open' action or a body click opens the app; other actions only close it.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report worker state, cache namespaces, entry count, sync tags and host activity.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    #[tool(description = "List the request URLs stored in a cache namespace (default: current).")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        let engine = self.worker.engine();
        keys_impl(engine.store(), engine.cache_name(), params.0).await
    }

    #[tool(description = "Purge cache entries by domain or count, or drop a whole namespace.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        let engine = self.worker.engine();
        purge_impl(engine.store(), engine.cache_name(), params.0).await
    }
}

impl ServerHandler for StashdServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "stashd".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
