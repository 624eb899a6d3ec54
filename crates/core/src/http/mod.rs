//! Request and response model shared by the policy engine and fetchers.
//!
//! The [`Fetcher`] trait is the seam between the cache policy and the
//! network; `stashd-client` provides the reqwest implementation.

pub mod request;
pub mod response;

pub use request::{Destination, Request, RequestMode};
pub use response::{Body, Response, ResponseType};

use async_trait::async_trait;

use crate::Error;

/// Network access for the cache policy.
///
/// Implementations return non-success statuses as responses. `Err` is
/// reserved for failures where no response arrived at all (offline, DNS,
/// connection reset, timeout).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Whether `host` is `domain` or one of its subdomains, ignoring case.
pub(crate) fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    !domain.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matches() {
        assert!(host_matches("fonts.gstatic.com", "fonts.gstatic.com"));
        assert!(host_matches("fonts.gstatic.com", "gstatic.com"));
        assert!(host_matches("Fonts.GStatic.com", "gstatic.com"));
        assert!(!host_matches("notgstatic.com", "gstatic.com"));
        assert!(!host_matches("gstatic.com.evil.net", "gstatic.com"));
        assert!(!host_matches("gstatic.com", ""));
    }
}
