//! Feed connection manager with keepalive and capped exponential backoff

use super::transport::{Dialer, FrameSink, FrameStream};
use super::types::{ConnectionEvent, ConnectionState, WsConfig, WsError, PING_FRAME, PONG_FRAME};
use crate::telemetry::{increment, CounterMetric};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

/// Consumer of inbound text frames
///
/// Keepalive replies never reach the handler.
#[async_trait]
pub trait FrameHandler: Send {
    async fn on_frame(&mut self, text: &str);
}

/// Subscription message for Polymarket WebSocket
#[derive(Debug, Serialize)]
struct SubscriptionMessage<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    assets_ids: &'a [String],
}

/// Owns the feed connection lifecycle for one session
///
/// Dials, subscribes with a fixed token set, keeps the connection alive with
/// text pings, and hands every inbound frame to the handler in order. A clean
/// subscribe resets the retry counter; every failed dial or dropped session
/// increments it. Reaching `max_reconnect_attempts` closes the manager.
pub struct ConnectionManager<D, H> {
    config: WsConfig,
    dialer: D,
    handler: H,
    token_ids: Vec<String>,
    retry: u32,
    state: watch::Sender<ConnectionState>,
    events: Option<mpsc::UnboundedSender<ConnectionEvent>>,
}

impl<D: Dialer, H: FrameHandler> ConnectionManager<D, H> {
    /// Create a manager that will subscribe to `token_ids`
    pub fn new(config: WsConfig, dialer: D, handler: H, token_ids: Vec<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            dialer,
            handler,
            token_ids,
            retry: 0,
            state,
            events: None,
        }
    }

    /// Forward lifecycle events to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Watch the connection state
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Consecutive failures since the last clean subscribe
    pub fn retry_count(&self) -> u32 {
        self.retry
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Run until the retry budget is exhausted
    ///
    /// Returns `Ok(())` only when there is nothing to subscribe to.
    pub async fn run(&mut self) -> Result<(), WsError> {
        if self.token_ids.is_empty() {
            tracing::warn!("No token IDs to subscribe, not connecting");
            self.set_state(ConnectionState::Closed);
            return Ok(());
        }

        loop {
            self.set_state(ConnectionState::Connecting);
            self.emit(ConnectionEvent::Dialing { retry: self.retry });

            match self.dialer.dial(&self.config.url).await {
                Ok((sink, stream)) => {
                    let reason = self.run_session(sink, stream).await;
                    increment(CounterMetric::Disconnects);
                    tracing::warn!(error = %reason, "Feed session ended");
                    self.set_state(ConnectionState::Disconnected);
                    self.emit(ConnectionEvent::Disconnected {
                        reason: reason.to_string(),
                    });
                }
                Err(e) => {
                    increment(CounterMetric::DialFailures);
                    tracing::warn!(error = %e, retry = self.retry + 1, "Feed dial failed");
                    self.set_state(ConnectionState::Disconnected);
                }
            }

            self.retry += 1;
            if self.retry >= self.config.max_reconnect_attempts {
                tracing::error!(attempts = self.retry, "Max reconnection attempts reached");
                self.set_state(ConnectionState::Closed);
                self.emit(ConnectionEvent::Closed {
                    attempts: self.retry,
                });
                return Err(WsError::MaxReconnectsExceeded(self.retry));
            }

            let delay = self.config.backoff_delay(self.retry);
            tracing::info!(retry = self.retry, delay_ms = delay.as_millis() as u64, "Reconnecting after backoff");
            self.emit(ConnectionEvent::Backoff {
                retry: self.retry,
                delay,
            });
            sleep(delay).await;
        }
    }

    /// Subscribe, start keepalive, and read until the session breaks
    async fn run_session(&mut self, mut sink: FrameSink, mut stream: FrameStream) -> WsError {
        let subscription = SubscriptionMessage {
            msg_type: "market",
            assets_ids: &self.token_ids,
        };
        let frame = match serde_json::to_string(&subscription) {
            Ok(frame) => frame,
            Err(e) => return e.into(),
        };
        if let Err(e) = sink.send(Message::Text(frame)).await {
            return e;
        }

        self.retry = 0;
        self.set_state(ConnectionState::Subscribed);
        self.emit(ConnectionEvent::Subscribed {
            tokens: self.token_ids.len(),
        });
        tracing::info!(tokens = self.token_ids.len(), "Sent subscription for tokens");

        let _keepalive = Keepalive::spawn(sink, self.config.ping_interval);

        loop {
            let next = match self.config.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => return WsError::IdleTimeout(limit),
                },
                None => stream.next().await,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    if text == PONG_FRAME {
                        tracing::trace!("Keepalive reply");
                        continue;
                    }
                    increment(CounterMetric::FramesReceived);
                    self.handler.on_frame(&text).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Received close frame");
                    return WsError::Closed;
                }
                Some(Ok(_)) => {
                    // Binary and control frames carry no market data
                }
                Some(Err(e)) => return e,
                None => return WsError::Closed,
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: ConnectionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Periodic text ping writer; aborted when the session is torn down
struct Keepalive {
    handle: JoinHandle<()>,
}

impl Keepalive {
    fn spawn(mut sink: FrameSink, every: Duration) -> Self {
        let every = every.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = sink.send(Message::Text(PING_FRAME.to_string())).await {
                    tracing::debug!(error = %e, "Keepalive stopped");
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Keepalive {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
