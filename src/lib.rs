//! poly-ticker: best bid/ask ticker cache for Polymarket 15-minute up/down markets
//!
//! This library provides the core components for:
//! - Market discovery per 15-minute slot via the Gamma API
//! - A feed connection manager with keepalive and capped reconnect backoff
//! - Ticker aggregation from book snapshots and price-change deltas
//! - Ticker sinks (Redis, in-memory)
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod market;
pub mod session;
pub mod sink;
pub mod telemetry;
pub mod ticker;
pub mod ws;
