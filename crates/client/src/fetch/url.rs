//! URL resolution for intercepted requests.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a request URL as a page would.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs keep their scheme (non-HTTP ones are bypassed later)
/// 3. Relative URLs resolve against `base`
/// 4. HTTP(S) hosts are lowercased
/// 5. Fragment is dropped
/// 6. Query string is kept intact (not reordered)
pub fn resolve(input: &str, base: &Url) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    if is_fetchable(&parsed)
        && let Some(host) = parsed.host_str()
    {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether the network fetcher can retrieve this URL.
pub fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Reject URLs the network fetcher cannot retrieve.
pub fn require_fetchable(url: &Url) -> Result<(), UrlError> {
    if is_fetchable(url) { Ok(()) } else { Err(UrlError::UnsupportedScheme(url.scheme().to_string())) }
}
