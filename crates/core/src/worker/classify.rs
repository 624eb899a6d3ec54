//! Request classification.
//!
//! A pure function of the request's URL and mode. Nothing here touches
//! storage; the engine recomputes the class for every request.

use crate::config::StrategyKind;
use crate::http::{Request, host_matches};

/// Which retrieval path a request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Not HTTP(S); the engine does not intervene.
    Bypass,
    /// Font delivery host, served network-first with a cache fallback.
    FontHost,
    /// Page navigation, served network-first with the offline document as fallback.
    Navigation,
    /// Everything else under the routed strategy, served cache-first.
    Generic,
    /// Every HTTP(S) request under the stale-while-revalidate strategy.
    CacheFirst,
}

/// Classify a request for the given strategy.
pub fn classify(request: &Request, strategy: StrategyKind, font_hosts: &[String]) -> RequestClass {
    if !request.is_http() {
        return RequestClass::Bypass;
    }

    match strategy {
        StrategyKind::StaleWhileRevalidate => RequestClass::CacheFirst,
        StrategyKind::Routed => {
            if is_font_host(request, font_hosts) {
                RequestClass::FontHost
            } else if request.is_navigation() {
                RequestClass::Navigation
            } else {
                RequestClass::Generic
            }
        }
    }
}

/// Host equals a font host or is a subdomain of one.
fn is_font_host(request: &Request, font_hosts: &[String]) -> bool {
    let Some(host) = request.url.host_str() else {
        return false;
    };
    font_hosts.iter().any(|font| host_matches(host, font))
}
