//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STASHD_*)
//! 2. TOML config file (if STASHD_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Which request-handling strategy the policy engine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Per-class routing: network-first for font hosts and navigations,
    /// cache-first for everything else.
    #[default]
    Routed,
    /// Uniform cache-first with background revalidation.
    StaleWhileRevalidate,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Routed => "routed",
            StrategyKind::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

/// A button shown on a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationActionConfig {
    pub action: String,
    pub title: String,
}

/// Presentation settings for push notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_notification_title")]
    pub title: String,

    /// Body used when a push arrives without a payload.
    #[serde(default = "default_notification_body")]
    pub default_body: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_icon")]
    pub badge: String,

    /// Vibration pattern in milliseconds (vibrate, pause, vibrate, ...).
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,

    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default)]
    pub require_interaction: bool,

    #[serde(default)]
    pub actions: Vec<NotificationActionConfig>,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STASHD_*)
/// 2. TOML config file (if STASHD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version token naming the current cache namespace.
    ///
    /// Set via STASHD_CACHE_NAME environment variable. Bumping it makes
    /// the next activation delete every other namespace.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Application origin that relative URLs resolve against.
    ///
    /// Set via STASHD_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Document served when a navigation cannot reach the network.
    ///
    /// Set via STASHD_OFFLINE_URL environment variable.
    #[serde(default = "default_offline_url")]
    pub offline_url: String,

    /// URLs fetched and stored at install time.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Hosts served network-first under the routed strategy.
    #[serde(default = "default_font_hosts")]
    pub font_hosts: Vec<String>,

    /// Request-handling strategy.
    ///
    /// Set via STASHD_STRATEGY (`routed` or `stale-while-revalidate`).
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Path to SQLite cache database.
    ///
    /// Set via STASHD_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via STASHD_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via STASHD_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via STASHD_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Background sync tags routed to the study-data sync routine.
    #[serde(default = "default_sync_tags")]
    pub sync_tags: Vec<String>,

    #[serde(default)]
    pub notification: NotificationConfig,
}

fn default_cache_name() -> String {
    "operacao-ata-v5".into()
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_offline_url() -> String {
    "./index.html".into()
}

fn default_precache_urls() -> Vec<String> {
    [
        "./",
        "./index.html",
        "./manifest.json",
        "./assets/logo-entalpia.png",
        "./assets/banner.png",
        "./assets/watermark.png",
        "./assets/icon-192.png",
        "./assets/icon-512.png",
        "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700;800&family=JetBrains+Mono:wght@500;700&display=swap",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_font_hosts() -> Vec<String> {
    vec!["fonts.googleapis.com".into(), "fonts.gstatic.com".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stashd-cache.sqlite")
}

fn default_user_agent() -> String {
    "stashd/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_sync_tags() -> Vec<String> {
    vec!["sync-study-data".into(), "sync-data".into()]
}

fn default_notification_title() -> String {
    "Operação ATA".into()
}

fn default_notification_body() -> String {
    "Hora de estudar!".into()
}

fn default_icon() -> String {
    "./assets/icon-192.png".into()
}

fn default_vibrate() -> Vec<u32> {
    vec![200, 100, 200]
}

fn default_tag() -> String {
    "study-reminder".into()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            default_body: default_notification_body(),
            icon: default_icon(),
            badge: default_icon(),
            vibrate: default_vibrate(),
            tag: default_tag(),
            require_interaction: false,
            actions: Vec::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: default_origin(),
            offline_url: default_offline_url(),
            precache_urls: default_precache_urls(),
            font_hosts: default_font_hosts(),
            strategy: StrategyKind::default(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            sync_tags: default_sync_tags(),
            notification: NotificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The application origin as a parsed URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Resolve a configured URL (possibly relative) against the origin.
    pub fn resolve(&self, url: &str) -> Result<Url, ConfigError> {
        self.origin_url()?
            .join(url)
            .map_err(|e| ConfigError::Invalid { field: url.into(), reason: e.to_string() })
    }

    /// Absolute URL of the offline fallback document.
    pub fn offline_document(&self) -> Result<Url, ConfigError> {
        self.resolve(&self.offline_url)
    }

    /// The precache set with every URL made absolute, in configured order.
    pub fn precache_set(&self) -> Result<Vec<Url>, ConfigError> {
        self.precache_urls.iter().map(|u| self.resolve(u)).collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STASHD_`
    /// 2. TOML file from `STASHD_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STASHD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STASHD_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
