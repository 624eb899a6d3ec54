//! Request identity keys for cache entries.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the storage key for a request.
///
/// Identity is the method plus the URL without its fragment, so
/// `/app.js#v2` and `/app.js` share an entry. Request headers never
/// participate.
pub fn compute_cache_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
