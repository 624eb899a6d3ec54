//! MCP tool implementations.
//!
//! Worker tools dispatch an event and wait for its completion; cache tools
//! go straight to storage.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod signals;
pub mod status;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use stashd_core::{CacheDb, EventOutcome, LocalHost, ServiceWorker};

use crate::error::ToolError;

/// The worker as the server runs it, generic over the network.
pub type Worker<F> = ServiceWorker<CacheDb, F, LocalHost>;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_output<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::Serialize(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

pub(crate) fn unexpected(expected: &str, outcome: EventOutcome) -> McpError {
    ToolError::UnexpectedOutcome(format!("expected {expected}, got {outcome:?}")).into()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rmcp::model::CallToolResult;
    use stashd_core::{AppConfig, CacheDb, Error, Fetcher, LocalHost, Request, Response, ResponseType};

    use super::Worker;

    /// Fetcher answering from a fixed URL table; anything else is offline.
    #[derive(Default)]
    pub struct TableFetcher {
        pages: Mutex<HashMap<String, (u16, String)>>,
    }

    impl TableFetcher {
        pub fn serve(&self, url: &str, status: u16, body: &str) {
            self.pages
                .lock()
                .unwrap()
                .insert(url.to_string(), (status, body.to_string()));
        }

        pub fn drop_page(&self, url: &str) {
            self.pages.lock().unwrap().remove(url);
        }
    }

    #[async_trait]
    impl Fetcher for TableFetcher {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            let page = self.pages.lock().unwrap().get(request.url.as_str()).cloned();
            match page {
                Some((status, body)) => Ok(Response::new(request.url.as_str(), status, ResponseType::Basic, body)),
                None => Err(Error::Network(format!("offline: {}", request.url))),
            }
        }
    }

    pub fn config() -> AppConfig {
        AppConfig {
            origin: "https://ata.example.org/".into(),
            precache_urls: vec!["./".into(), "./index.html".into()],
            ..Default::default()
        }
    }

    pub async fn worker() -> (Arc<Worker<TableFetcher>>, Arc<TableFetcher>) {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(TableFetcher::default());
        fetcher.serve("https://ata.example.org/", 200, "root");
        fetcher.serve("https://ata.example.org/index.html", 200, "<html>shell</html>");
        let worker = Worker::new(&config(), store, fetcher.clone(), Arc::new(LocalHost::new())).unwrap();
        (Arc::new(worker), fetcher)
    }

    /// Parse the JSON text content of a tool result.
    pub fn output_json(result: &CallToolResult) -> serde_json::Value {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
