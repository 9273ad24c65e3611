//! Redis-backed sink

use super::{SinkError, TickerSink};
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;

/// Writes tickers with plain `SET`, no expiry
///
/// The connection manager reconnects on its own; a failed write surfaces as
/// an error for that write only.
#[derive(Clone)]
pub struct RedisSink {
    conn: ConnectionManager,
}

impl RedisSink {
    /// Open a managed connection to `url`
    pub async fn connect(url: &str) -> Result<Self, SinkError> {
        let client = Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url = %url, "Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl TickerSink for RedisSink {
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), SinkError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}
