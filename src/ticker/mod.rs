//! Ticker module
//!
//! Best bid/ask state per token, merged from book snapshots and
//! price-change deltas, and the key each snapshot is cached under.

mod aggregator;
mod message;

pub use aggregator::{best_ask, best_bid, carry_forward, TickerAggregator};
pub use message::{
    decimal_from_value, decode_frame, millis_from_value, BookLevel, BookUpdate, FeedEvent,
    PriceChange, PriceChangeUpdate,
};

use crate::market::Market;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Live top-of-book state for one token
///
/// Serialized with the field names downstream readers of the cache expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(rename = "bestBid", with = "rust_decimal::serde::float")]
    pub best_bid: Decimal,
    #[serde(rename = "bidSz", with = "rust_decimal::serde::float")]
    pub bid_size: Decimal,
    #[serde(rename = "bestAsk", with = "rust_decimal::serde::float")]
    pub best_ask: Decimal,
    #[serde(rename = "askSz", with = "rust_decimal::serde::float")]
    pub ask_size: Decimal,
    pub token_id: String,
    pub slug: String,
    /// Source event time (ms)
    pub ts: i64,
    /// Local receive time (ms)
    pub ts_sv: i64,
}

impl Ticker {
    /// Ticker with no known prices
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            best_bid: Decimal::ZERO,
            bid_size: Decimal::ZERO,
            best_ask: Decimal::ZERO,
            ask_size: Decimal::ZERO,
            token_id: token_id.into(),
            slug: String::new(),
            ts: 0,
            ts_sv: 0,
        }
    }
}

/// Cache key for a token's ticker: `{ASSET}_{outcome}_15m_polymarket_ticker`
pub fn ticker_key(market: &Market, outcome: &str) -> String {
    format!(
        "{}_{}_15m_polymarket_ticker",
        market.asset(),
        outcome.to_lowercase()
    )
}
