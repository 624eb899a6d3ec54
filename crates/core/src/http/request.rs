//! Intercepted request descriptors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::cache::hash::compute_cache_key;

/// How the originating client issued the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// A top-level page navigation.
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

/// What kind of resource the request is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Worker,
    /// Plain `fetch()` calls and anything else without a destination.
    #[default]
    Empty,
}

/// An intercepted request: the identity and intent the cache policy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    pub method: String,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl Request {
    /// Build a request from raw parts.
    ///
    /// The URL must be absolute; any scheme is accepted so that non-HTTP
    /// requests can reach the classifier and be bypassed there.
    pub fn new(url: &str, method: &str, mode: RequestMode, destination: Destination) -> Result<Self, Error> {
        let url = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        if method.trim().is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }
        Ok(Self { url, method: method.trim().to_ascii_uppercase(), mode, destination })
    }

    /// A sub-resource GET request.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new(url, "GET", RequestMode::Cors, Destination::Empty)
    }

    /// A page navigation request for a document.
    pub fn navigate(url: &str) -> Result<Self, Error> {
        Self::new(url, "GET", RequestMode::Navigate, Destination::Document)
    }

    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Storage key for this request's identity.
    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_method() {
        let req = Request::new("https://example.com/", " post ", RequestMode::Cors, Destination::Empty).unwrap();
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_rejects_relative_url() {
        let result = Request::get("/index.html");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_empty_method() {
        let result = Request::new("https://example.com/", "  ", RequestMode::Cors, Destination::Empty);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_non_http_scheme_parses() {
        let req = Request::get("chrome-extension://abcdef/script.js").unwrap();
        assert!(!req.is_http());

        let data = Request::get("data:text/plain,hello").unwrap();
        assert!(!data.is_http());
    }

    #[test]
    fn test_navigate_constructor() {
        let req = Request::navigate("https://example.com/study").unwrap();
        assert!(req.is_navigation());
        assert_eq!(req.destination, Destination::Document);
        assert!(req.is_http());
    }

    #[test]
    fn test_cache_key_ignores_mode() {
        let nav = Request::navigate("https://example.com/").unwrap();
        let sub = Request::get("https://example.com/").unwrap();
        assert_eq!(nav.cache_key(), sub.cache_key());
    }

    #[test]
    fn test_mode_serde_names() {
        assert_eq!(serde_json::to_string(&RequestMode::SameOrigin).unwrap(), "\"same-origin\"");
        assert_eq!(serde_json::from_str::<RequestMode>("\"navigate\"").unwrap(), RequestMode::Navigate);
        assert_eq!(serde_json::from_str::<Destination>("\"document\"").unwrap(), Destination::Document);
    }
}
