//! Unified error types for stashd.
//!
//! Every variant carries a stable code prefix so failures stay greppable in
//! the JSON logs and map onto distinct MCP error codes.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the stashd agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL, unknown request mode).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The network could not be reached or the connection failed.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Bulk precache at install time failed; nothing was committed.
    #[error("PRECACHE_FAILED: {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// A response body was read twice, or cloned after being read.
    #[error("BODY_USED: response body already consumed")]
    BodyUsed,

    /// Navigation fell back to the offline document but it is not cached.
    #[error("OFFLINE_FALLBACK_MISSING: {0}")]
    OfflineFallbackMissing(String),

    /// Operation not allowed in the worker's current lifecycle state.
    #[error("WORKER_STATE: {0}")]
    WorkerState(String),
}

impl Error {
    /// Whether the failure happened before a usable response reached us.
    ///
    /// Only these failures fall back to the cache or the offline document;
    /// anything else is returned to the caller.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Error::Network(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Network(msg) => (-32004, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::PrecacheFailed { .. } => (-32008, err.to_string()),
            Error::BodyUsed => (-32009, "Response body already consumed".to_string()),
            Error::OfflineFallbackMissing(msg) => (-32010, msg.clone()),
            Error::WorkerState(msg) => (-32011, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::OfflineFallbackMissing("https://example.com/index.html".to_string());
        assert!(err.to_string().starts_with("OFFLINE_FALLBACK_MISSING"));
        assert!(err.to_string().contains("index.html"));
    }

    #[test]
    fn test_precache_failed_display() {
        let err = Error::PrecacheFailed { url: "https://example.com/a.png".into(), reason: "status 404".into() };
        assert_eq!(err.to_string(), "PRECACHE_FAILED: https://example.com/a.png: status 404");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::Network("connection refused".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32004);

        let mcp_err: McpError = Error::BodyUsed.into();
        assert_eq!(mcp_err.code.0, -32009);
    }

    #[test]
    fn test_network_failure_classification() {
        assert!(Error::Network("offline".into()).is_network_failure());
        assert!(Error::FetchTimeout("20000ms".into()).is_network_failure());
        assert!(!Error::BodyUsed.is_network_failure());
        assert!(Error::FetchTooLarge("6MB".into()).is_network_failure());
        assert!(!Error::InvalidUrl("x".into()).is_network_failure());
        assert!(!Error::Database(tokio_rusqlite::Error::ConnectionClosed).is_network_failure());
    }
}
