//! Configuration data structures for the firecache offline layer.
//!
//! This module defines the schema for the application settings: the
//! interception server, the upstream dashboard server, the cache generation
//! set, background sync probing, and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP interception server settings (host, port, body limit).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream dashboard server settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Cache generation naming, static manifest and fallback texts.
    #[serde(default)]
    pub generations: GenerationConfig,

    /// Background sync probing settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in interception server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8088`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    /// Default: `10 MiB`
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Settings for the upstream application server connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the dashboard server. Relative request paths and relative
    /// manifest entries are resolved against it, and its origin decides
    /// which responses count as `basic`.
    /// Default: `http://127.0.0.1:8000`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds.
    /// Default: `5`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// The explicit description of the running cache generation set.
///
/// Everything the router and the lifecycle controller need to know about
/// "which version is running" lives here; nothing is read from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Name of the current static asset generation. Also reported as the
    /// running version identifier during update checks.
    #[serde(default = "default_static_name")]
    pub static_name: String,

    /// Name of the current API response generation.
    #[serde(default = "default_api_name")]
    pub api_name: String,

    /// URLs pre-cached into the static generation at install time.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Path prefix routed to the API strategy.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Endpoint returning `{"version": ...}` for update checks.
    #[serde(default = "default_version_endpoint")]
    pub version_endpoint: String,

    /// Tag registered with the scheduler when a mutating request fails.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Plain-text body served when a static request cannot be satisfied.
    #[serde(default = "default_offline_page_text")]
    pub offline_page_text: String,

    /// Message placed in the `error` field of the API offline payload.
    #[serde(default = "default_offline_api_message")]
    pub offline_api_message: String,

    /// Message sent with `sync-complete` client notifications.
    #[serde(default = "default_sync_complete_message")]
    pub sync_complete_message: String,

    /// Icon shown with push notifications.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    /// Badge shown with push notifications.
    #[serde(default = "default_notification_badge")]
    pub notification_badge: String,

    /// Defaults applied to push payloads missing fields.
    #[serde(default)]
    pub push_defaults: PushDefaults,
}

/// Fallback values for push payload fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushDefaults {
    #[serde(default = "default_push_title")]
    pub title: String,

    #[serde(default = "default_push_body")]
    pub body: String,

    #[serde(default = "default_push_url")]
    pub url: String,
}

/// Settings for the connectivity probe that fires pending sync intents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upstream path probed to detect restored connectivity.
    /// Default: `/api/version`
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// First delay between probes in milliseconds.
    /// Default: `1000`
    #[serde(default = "default_initial_interval")]
    pub initial_interval_ms: u64,

    /// Upper bound for the delay between probes in seconds.
    /// Default: `60`
    #[serde(default = "default_max_interval")]
    pub max_interval_seconds: u64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl GenerationConfig {
    /// Generation names that survive activation. Everything else is evicted.
    pub fn whitelist(&self) -> [&str; 2] {
        [self.static_name.as_str(), self.api_name.as_str()]
    }

    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist().contains(&name)
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            static_name: default_static_name(),
            api_name: default_api_name(),
            manifest: default_manifest(),
            api_prefix: default_api_prefix(),
            version_endpoint: default_version_endpoint(),
            sync_tag: default_sync_tag(),
            offline_page_text: default_offline_page_text(),
            offline_api_message: default_offline_api_message(),
            sync_complete_message: default_sync_complete_message(),
            notification_icon: default_notification_icon(),
            notification_badge: default_notification_badge(),
            push_defaults: PushDefaults::default(),
        }
    }
}

impl Default for PushDefaults {
    fn default() -> Self {
        Self {
            title: default_push_title(),
            body: default_push_body(),
            url: default_push_url(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            probe_path: default_probe_path(),
            initial_interval_ms: default_initial_interval(),
            max_interval_seconds: default_max_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8088
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_static_name() -> String {
    "forest-fires-cache-v2".to_string()
}

fn default_api_name() -> String {
    "forest-fires-api-cache-v2".to_string()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/fires",
        "/analytics",
        "/logs",
        "/summary",
        "/login",
        "/manifest.json",
        "/static/icon-192.png",
        "/static/icon-512.png",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js",
        "https://cdn.jsdelivr.net/npm/chart.js",
        "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css",
        "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js",
        "/socket.io/socket.io.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_version_endpoint() -> String {
    "/api/version".to_string()
}

fn default_sync_tag() -> String {
    "sync-fires".to_string()
}

fn default_offline_page_text() -> String {
    "Offline mode: page unavailable".to_string()
}

fn default_offline_api_message() -> String {
    "Offline: data unavailable".to_string()
}

fn default_sync_complete_message() -> String {
    "Data synchronized".to_string()
}

fn default_notification_icon() -> String {
    "/static/icon-192.png".to_string()
}

fn default_notification_badge() -> String {
    "/static/icon-192.png".to_string()
}

fn default_push_title() -> String {
    "Update".to_string()
}

fn default_push_body() -> String {
    "Data updated".to_string()
}

fn default_push_url() -> String {
    "/fires".to_string()
}

fn default_probe_path() -> String {
    "/api/version".to_string()
}

fn default_initial_interval() -> u64 {
    1000
}

fn default_max_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
