//! HTTP fetch pipeline for the cache policy engine.
//!
//! ### Request handling
//! - Only HTTP(S) URLs are fetched; other schemes are rejected
//! - The request method is forwarded; requests carry no body
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//!
//! ### Responses
//! - Every status is returned as a response; only transport failures
//!   (DNS, connect, reset, timeout) are errors
//! - Responses from the application origin are `basic`
//! - Cross-origin responses are `cors`, or `opaque` for `no-cors` requests

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, is_fetchable, require_fetchable, resolve};

use stashd_core::{AppConfig, Error, Fetcher, Request, RequestMode, Response, ResponseType};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "stashd/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Application origin; same-origin responses are typed `basic`.
    pub origin: Option<::url::Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "stashd/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            origin: None,
        }
    }
}

impl FetchConfig {
    /// Fetch settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            origin: config.origin_url().ok(),
            ..Default::default()
        }
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn response_type(&self, request: &Request, final_url: &::url::Url) -> ResponseType {
        match &self.config.origin {
            Some(origin) if origin.origin() == final_url.origin() => ResponseType::Basic,
            _ if request.mode == RequestMode::NoCors => ResponseType::Opaque,
            _ => ResponseType::Cors,
        }
    }
}

fn transport_error(err: reqwest::Error, url: &::url::Url) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::Network(format!("{url}: {err}"))
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    /// Fetch a request, returning the response whatever its status.
    ///
    /// Enforces the byte limit both on the declared length and the body read.
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        require_fetchable(&request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let response = self
            .http
            .request(method, request.url.as_str())
            .send()
            .await
            .map_err(|e| transport_error(e, &request.url))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response.bytes().await.map_err(|e| transport_error(e, &request.url))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} ({}) in {}ms ({} bytes)",
            request.url,
            final_url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        let kind = self.response_type(request, &final_url);
        let mut out = Response::new(final_url.as_str(), status.as_u16(), kind, bytes)
            .with_status_text(status.canonical_reason().unwrap_or_default());
        out.headers = headers;
        Ok(out)
    }
}

/// Content-Type of a response, if present.
pub fn content_type(response: &Response) -> Option<&str> {
    response.header(header::CONTENT_TYPE.as_str())
}
