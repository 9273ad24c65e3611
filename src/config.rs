//! Configuration types for poly-ticker

use crate::market::{GammaConfig, GAMMA_API_URL};
use crate::session::SessionConfig;
use crate::telemetry::LogFormat;
use crate::ws::{WsConfig, POLYMARKET_WS_URL};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration used when no config file is present
const BUNDLED_CONFIG: &str = include_str!("../config.toml.example");

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Market-channel connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Seconds between text pings
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Consecutive failures tolerated before the session closes
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Ceiling on any single backoff delay
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Reconnect when no frame arrives for this long; unset disables the check
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

fn default_ws_url() -> String {
    POLYMARKET_WS_URL.to_string()
}
fn default_ping_interval_secs() -> u64 {
    10
}
fn default_max_reconnect_attempts() -> u32 {
    10
}
fn default_backoff_base_secs() -> u64 {
    1
}
fn default_max_backoff_secs() -> u64 {
    60
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            ping_interval_secs: default_ping_interval_secs(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            backoff_base_secs: default_backoff_base_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            idle_timeout_secs: None,
        }
    }
}

/// Market discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,

    /// Asset symbols, resolved as `{asset}-updown-15m-{slot}`
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Resolve the upcoming slot instead of the current one
    #[serde(default)]
    pub next_market: bool,
}

fn default_gamma_url() -> String {
    GAMMA_API_URL.to_string()
}
fn default_assets() -> Vec<String> {
    ["btc", "eth", "sol", "xrp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_request_timeout_secs() -> u64 {
    20
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            assets: default_assets(),
            request_timeout_secs: default_request_timeout_secs(),
            next_market: false,
        }
    }
}

/// Ticker sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub backend: SinkBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

/// Where ticker snapshots are written
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    #[default]
    Redis,
    /// In-process map, nothing leaves the process
    Memory,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            backend: SinkBackend::Redis,
            redis_url: default_redis_url(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus listener port; unset disables the exporter
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or the bundled configuration when `path` does not exist
    ///
    /// A file that exists but does not parse or validate is an error.
    pub fn load_or_bundled(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Self::bundled();
        }
        Self::load(path)
    }

    /// The bundled `config.toml.example`
    pub fn bundled() -> anyhow::Result<Self> {
        let config: Config =
            toml::from_str(BUNDLED_CONFIG).context("Failed to parse bundled configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the feed can not run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feed.max_reconnect_attempts == 0 {
            bail!("feed.max_reconnect_attempts must be at least 1");
        }
        if self.feed.ping_interval_secs == 0 {
            bail!("feed.ping_interval_secs must be positive");
        }
        if self.feed.idle_timeout_secs == Some(0) {
            bail!("feed.idle_timeout_secs must be positive when set");
        }
        if self.market.assets.is_empty() {
            bail!("market.assets must list at least one asset");
        }
        Ok(())
    }

    /// Connection settings for the feed
    pub fn ws_config(&self) -> WsConfig {
        WsConfig::new(&self.feed.ws_url)
            .max_reconnects(self.feed.max_reconnect_attempts)
            .backoff_base(Duration::from_secs(self.feed.backoff_base_secs))
            .max_delay(Duration::from_secs(self.feed.max_backoff_secs))
            .ping_interval(Duration::from_secs(self.feed.ping_interval_secs))
            .idle_timeout(self.feed.idle_timeout_secs.map(Duration::from_secs))
    }

    /// Gamma client settings
    pub fn gamma_config(&self) -> GammaConfig {
        GammaConfig {
            base_url: self.market.gamma_url.clone(),
            timeout: Duration::from_secs(self.market.request_timeout_secs),
        }
    }

    /// Session settings
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            assets: self.market.assets.clone(),
            next_market: self.market.next_market,
            ws: self.ws_config(),
        }
    }
}
