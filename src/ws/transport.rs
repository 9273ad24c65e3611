//! Frame transport behind the connection manager

use super::types::WsError;
use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt, TryStreamExt};
use std::pin::Pin;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Write half of a feed connection
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Read half of a feed connection
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Message, WsError>> + Send>>;

/// Opens feed connections
///
/// The manager only needs the split halves: the write half goes to the
/// keepalive task after the subscription is sent, the read half stays with
/// the read loop.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Dial `url` and return the (write, read) halves
    async fn dial(&self, url: &str) -> Result<(FrameSink, FrameStream), WsError>;
}

/// Dialer backed by tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteDialer;

#[async_trait]
impl Dialer for TungsteniteDialer {
    async fn dial(&self, url: &str) -> Result<(FrameSink, FrameStream), WsError> {
        tracing::info!(url = %url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (write, read) = ws_stream.split();
        let sink = write.sink_map_err(|e| WsError::SendFailed(e.to_string()));
        let stream = read.map_err(|e| WsError::ReadFailed(e.to_string()));

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}
