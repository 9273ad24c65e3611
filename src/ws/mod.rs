//! Feed connection management
//!
//! Dial, subscribe, keepalive, read loop, and reconnection with capped
//! exponential backoff for the Polymarket market channel.

mod client;
mod transport;
mod types;

pub use client::{ConnectionManager, FrameHandler};
pub use transport::{Dialer, FrameSink, FrameStream, TungsteniteDialer};
pub use types::{
    ConnectionEvent, ConnectionState, WsConfig, WsError, PING_FRAME, PONG_FRAME,
    POLYMARKET_WS_URL,
};
