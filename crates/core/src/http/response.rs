//! Responses with single-read bodies.
//!
//! A [`Body`] can be read exactly once. Any path that both returns a
//! response to its caller and persists it must take [`Response::try_clone`]
//! before the first read; cloning afterwards fails with [`Error::BodyUsed`].

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Provenance class of a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response the client may read.
    Cors,
    /// Cross-origin response whose contents are hidden from the client.
    Opaque,
    /// Network error placeholder.
    Error,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(ResponseType::Basic),
            "cors" => Some(ResponseType::Cors),
            "opaque" => Some(ResponseType::Opaque),
            "error" => Some(ResponseType::Error),
            _ => None,
        }
    }
}

/// A response body that can be consumed once.
#[derive(Debug)]
pub struct Body {
    bytes: Option<Bytes>,
}

impl Body {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: Some(bytes.into()) }
    }

    /// Consume the body.
    pub fn take(&mut self) -> Result<Bytes, Error> {
        self.bytes.take().ok_or(Error::BodyUsed)
    }

    fn try_clone(&self) -> Result<Self, Error> {
        match &self.bytes {
            Some(b) => Ok(Self { bytes: Some(b.clone()) }),
            None => Err(Error::BodyUsed),
        }
    }
}

/// A response as seen by the cache policy.
///
/// Deliberately not `Clone`: duplication goes through [`Response::try_clone`].
#[derive(Debug)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub kind: ResponseType,
    pub headers: Vec<(String, String)>,
    body: Body,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, kind: ResponseType, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status,
            status_text: String::new(),
            kind,
            headers: Vec::new(),
            body: Body::new(body),
        }
    }

    /// Builder-style header append.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Duplicate the response. Fails once the body has been read.
    pub fn try_clone(&self) -> Result<Self, Error> {
        Ok(Self {
            url: self.url.clone(),
            status: self.status,
            status_text: self.status_text.clone(),
            kind: self.kind,
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
        })
    }

    /// Read the body, consuming it.
    pub fn bytes(&mut self) -> Result<Bytes, Error> {
        self.body.take()
    }

    /// Read the body as UTF-8 (lossy), consuming it.
    pub fn text(&mut self) -> Result<String, Error> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
