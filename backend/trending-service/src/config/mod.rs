use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
        }
    }
}

/// Tunables for the batch engine that are operational rather than
/// admin-facing (admin-facing knobs live in the persisted TrendingSettings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between scoring/selection cycles
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Lease TTL guarding single-flight cycles
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,
    /// Posts older than this are never rescored
    #[serde(default = "default_scoring_lookback_days")]
    pub scoring_lookback_days: i64,
    /// Per-user feed inbox retention cap
    #[serde(default = "default_feed_retention")]
    pub feed_retention: i64,
    /// Max trending injections per user per 24h
    #[serde(default = "default_trending_injection_cap")]
    pub trending_injection_cap: i64,
    /// Audience size considered for trending discovery injection
    #[serde(default = "default_injection_audience")]
    pub injection_audience: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
            lease_ttl_secs: default_lease_ttl_secs(),
            scoring_lookback_days: default_scoring_lookback_days(),
            feed_retention: default_feed_retention(),
            trending_injection_cap: default_trending_injection_cap(),
            injection_audience: default_injection_audience(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
    #[serde(default = "default_graph_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_graph_retries")]
    pub max_retries: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            timeout_secs: default_graph_timeout_secs(),
            max_retries: default_graph_retries(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("APP_PORT must be a valid port number")?,
                log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            },
            redis: RedisConfig {
                enabled: std::env::var("REDIS_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
                url: std::env::var("REDIS_URL").unwrap_or_else(|_| default_redis_url()),
            },
            engine: EngineConfig {
                cycle_interval_secs: env_or("TRENDING_CYCLE_INTERVAL_SECS", || {
                    default_cycle_interval_secs()
                }),
                lease_ttl_secs: env_or("TRENDING_LEASE_TTL_SECS", || default_lease_ttl_secs()),
                scoring_lookback_days: env_or("SCORING_LOOKBACK_DAYS", || {
                    default_scoring_lookback_days()
                }),
                feed_retention: env_or("FEED_RETENTION", || default_feed_retention()),
                trending_injection_cap: env_or("TRENDING_INJECTION_CAP", || {
                    default_trending_injection_cap()
                }),
                injection_audience: env_or("TRENDING_INJECTION_AUDIENCE", || {
                    default_injection_audience()
                }),
            },
            graph: GraphConfig {
                base_url: std::env::var("GRAPH_SERVICE_URL")
                    .unwrap_or_else(|_| default_graph_base_url()),
                timeout_secs: env_or("GRAPH_SERVICE_TIMEOUT_SECS", || {
                    default_graph_timeout_secs()
                }),
                max_retries: env_or("GRAPH_SERVICE_MAX_RETRIES", || default_graph_retries()),
            },
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: impl Fn() -> T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(default)
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_cycle_interval_secs() -> u64 {
    300
}

fn default_lease_ttl_secs() -> u64 {
    240
}

fn default_scoring_lookback_days() -> i64 {
    7
}

fn default_feed_retention() -> i64 {
    500
}

fn default_trending_injection_cap() -> i64 {
    5
}

fn default_injection_audience() -> i64 {
    1000
}

fn default_graph_base_url() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_graph_timeout_secs() -> u64 {
    5
}

fn default_graph_retries() -> u32 {
    3
}
