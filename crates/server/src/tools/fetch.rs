//! sw_fetch tool implementation.
//!
//! Replays an intercepted request through the worker and reports the
//! response it would hand back to the page.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stashd_core::{Destination, Error, Event, EventOutcome, FetchOutcome, Fetcher, Request, RequestMode};
use url::Url;

use super::{Worker, json_output, unexpected};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Request URL, absolute or relative to the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "cors" (default) or "no-cors".
    #[serde(default)]
    pub mode: Option<RequestMode>,

    /// Resource destination. Defaults to "document" for navigations and
    /// "empty" otherwise.
    #[serde(default)]
    pub destination: Option<Destination>,
}

pub(crate) fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// False when the worker let the request through to the network untouched.
    pub handled: bool,
    /// "network", "cache" or "offline".
    pub source: Option<String>,
    pub url: Option<String>,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    /// Response type: "basic", "cors", "opaque" or "error".
    #[serde(rename = "type")]
    pub response_type: Option<String>,
    pub headers: Vec<HeaderPair>,
    /// Body as text when it is valid UTF-8.
    pub body_text: Option<String>,
    /// Body as base64 otherwise.
    pub body_base64: Option<String>,
    pub body_bytes: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<F: Fetcher + 'static>(
    worker: &Arc<Worker<F>>, origin: &Url, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let url = stashd_client::resolve(&params.url, origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mode = params.mode.unwrap_or_default();
    let destination = params.destination.unwrap_or(match mode {
        RequestMode::Navigate => Destination::Document,
        _ => Destination::Empty,
    });
    let request = Request::new(url.as_str(), &params.method, mode, destination)?;

    let outcome = match worker.dispatch(Event::Fetch(request)).wait().await? {
        EventOutcome::Fetched(outcome) => outcome,
        other => return Err(unexpected("fetch", other)),
    };

    let output = match outcome {
        FetchOutcome::Bypass => SwFetchOutput::default(),
        FetchOutcome::Respond { mut response, source } => {
            let body = response.bytes()?;
            let (body_text, body_base64) = match std::str::from_utf8(&body) {
                Ok(text) => (Some(text.to_string()), None),
                Err(_) => (None, Some(BASE64.encode(&body))),
            };

            SwFetchOutput {
                handled: true,
                source: Some(source.as_str().to_string()),
                url: Some(response.url.clone()),
                status: Some(response.status),
                status_text: Some(response.status_text.clone()),
                response_type: Some(response.kind.as_str().to_string()),
                headers: response
                    .headers
                    .iter()
                    .map(|(name, value)| HeaderPair { name: name.clone(), value: value.clone() })
                    .collect(),
                body_text,
                body_base64,
                body_bytes: body.len(),
            }
        }
    };

    json_output(&output)
}
