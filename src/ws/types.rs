//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

/// Polymarket CLOB WebSocket URL for market data
pub const POLYMARKET_WS_URL: &str = "wss://ws-subscriptions-clob.polymarket.com/ws/market";

/// Literal keepalive frame sent by the client
pub const PING_FRAME: &str = "PING";

/// Literal keepalive reply sent by the server
pub const PONG_FRAME: &str = "PONG";

/// Feed connection configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Retry budget; reaching it closes the manager for good
    pub max_reconnect_attempts: u32,
    /// Unit of the exponential backoff (delay = base * 2^retry)
    pub backoff_base: Duration,
    /// Ceiling applied to every backoff delay
    pub max_reconnect_delay: Duration,
    /// Interval for sending text ping frames
    pub ping_interval: Duration,
    /// Treat a read that stays silent this long as a disconnect
    pub idle_timeout: Option<Duration>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: POLYMARKET_WS_URL.to_string(),
            max_reconnect_attempts: 10,
            backoff_base: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            ping_interval: Duration::from_secs(10),
            idle_timeout: None,
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the retry budget
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set the backoff unit
    pub fn backoff_base(mut self, d: Duration) -> Self {
        self.backoff_base = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Set the read idle timeout
    pub fn idle_timeout(mut self, d: Option<Duration>) -> Self {
        self.idle_timeout = d;
        self
    }

    /// Backoff delay to wait after the `retry`-th consecutive failure
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        // 2^31 seconds is already far past any sane cap
        let factor = 1u32.checked_shl(retry.min(31)).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.max_reconnect_delay)
            .min(self.max_reconnect_delay)
    }
}

/// Lifecycle state of the feed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live connection, a dial will follow
    Disconnected,
    /// Dial in progress
    Connecting,
    /// Subscription sent, read loop running
    Subscribed,
    /// Retry budget exhausted; terminal
    Closed,
}

/// Lifecycle notifications emitted by the connection manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Dialing the feed endpoint
    Dialing { retry: u32 },
    /// Waiting before the next dial
    Backoff { retry: u32, delay: Duration },
    /// Subscription frame sent for this many tokens
    Subscribed { tokens: usize },
    /// Session torn down
    Disconnected { reason: String },
    /// Retry budget exhausted
    Closed { attempts: u32 },
}

/// WebSocket errors
#[derive(Debug, Error)]
pub enum WsError {
    /// Dial failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Writing a frame failed
    #[error("Send failed: {0}")]
    SendFailed(String),
    /// Reading a frame failed
    #[error("Read failed: {0}")]
    ReadFailed(String),
    /// Server closed the stream
    #[error("Connection closed by peer")]
    Closed,
    /// No frame arrived within the idle timeout
    #[error("No frame received for {0:?}")]
    IdleTimeout(Duration),
    /// Retry budget exhausted
    #[error("Maximum reconnection attempts exceeded after {0} attempts")]
    MaxReconnectsExceeded(u32),
    /// Subscription frame could not be encoded
    #[error("Failed to encode subscription: {0}")]
    Encode(#[from] serde_json::Error),
}
