//! Configuration management for FreeMobile Netstat

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Aggregation cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Statistics ingestion and aggregation rules
    #[serde(default)]
    pub stats: StatsConfig,

    /// Dashboard web server configuration
    #[serde(default)]
    pub webserver: WebServerConfig,

    /// Dashboard behaviour
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Version prefix all API routes are nested under
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

/// Aggregation cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the in-process cache
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Lifetime of entries whose range may still receive uploads, in seconds
    #[serde(default = "default_recent_ttl")]
    pub recent_ttl_seconds: u64,

    /// Maximum number of cached ranges
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

/// Statistics ingestion and aggregation rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// IANA timezone used to decide what "today" is
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Longest accepted chart range in days (exclusive)
    #[serde(default = "default_max_range_days")]
    pub max_range_days: i64,

    /// Uploads older than this many days are ignored
    #[serde(default = "default_upload_window_days")]
    pub upload_window_days: i64,

    /// Cumulated 4G time, in milliseconds, above which a device model counts as 4G
    #[serde(default = "default_is_4g_threshold_ms")]
    pub is_4g_threshold_ms: i64,
}

/// Dashboard web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_web_port")]
    pub port: u16,

    /// Base URL of the statistics API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// HTTP timeout for statistics requests, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
}

/// Dashboard behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Length of the default range, in days, ending today
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,

    /// Fade-in duration of the chart area, in milliseconds
    #[serde(default = "default_fade_in_ms")]
    pub fade_in_ms: u64,

    /// Slide-down duration of the help panel, in milliseconds
    #[serde(default = "default_slide_down_ms")]
    pub slide_down_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_web_port() -> u16 {
    8081
}

fn default_api_prefix() -> String {
    "/2".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_idle_timeout() -> u64 {
    600
}

const fn default_cache_enabled() -> bool {
    true
}

const fn default_recent_ttl() -> u64 {
    3600
}

const fn default_cache_max_entries() -> usize {
    1024
}

fn default_timezone() -> String {
    "Europe/Paris".to_string()
}

const fn default_max_range_days() -> i64 {
    31
}

const fn default_upload_window_days() -> i64 {
    7
}

const fn default_is_4g_threshold_ms() -> i64 {
    24 * 60 * 60 * 1000
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

const fn default_fetch_timeout() -> u64 {
    15
}

const fn default_window_days() -> i64 {
    7
}

const fn default_fade_in_ms() -> u64 {
    400
}

const fn default_slide_down_ms() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            recent_ttl_seconds: default_recent_ttl(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            max_range_days: default_max_range_days(),
            upload_window_days: default_upload_window_days(),
            is_4g_threshold_ms: default_is_4g_threshold_ms(),
        }
    }
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_web_port(),
            api_base_url: std::env::var("FMNS_API_BASE_URL")
                .unwrap_or_else(|_| default_api_base_url()),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            fade_in_ms: default_fade_in_ms(),
            slide_down_ms: default_slide_down_ms(),
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

impl StatsConfig {
    /// Parse the configured timezone
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone name is not a known IANA zone.
    pub fn tz(&self) -> crate::Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| crate::Error::Configuration {
                message: format!("unknown timezone {}: {e}", self.timezone),
            })
    }
}

impl Config {
    /// Load configuration from an optional `config` file and `FMNS_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("FMNS").separator("__"))
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;
        loaded.stats.tz()?;
        Ok(loaded)
    }
}

impl Default for Config {
    fn default() -> Self {
        let database_url = std::env::var("FMNS_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "postgresql://localhost/fmns-api".to_string());

        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: database_url,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout: default_connect_timeout(),
                idle_timeout: default_idle_timeout(),
            },
            cache: CacheConfig::default(),
            stats: StatsConfig::default(),
            webserver: WebServerConfig::default(),
            dashboard: DashboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
