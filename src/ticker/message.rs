//! Typed market-channel messages
//!
//! Inbound frames are a single update object or an array of them. Each
//! object is decoded on its own by its `event_type` tag; `book` and
//! `price_change` are the only shapes kept, every other tag decodes to
//! [`FeedEvent::Unknown`]. Numeric fields arrive as strings or numbers and
//! are normalized here, at the ingestion boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// One update from the market channel
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event_type")]
pub enum FeedEvent {
    /// Full order book snapshot for one token
    #[serde(rename = "book")]
    Book(BookUpdate),
    /// Partial best bid/ask updates for several tokens
    #[serde(rename = "price_change")]
    PriceChange(PriceChangeUpdate),
    /// Any other event type
    #[serde(other)]
    Unknown,
}

/// Order book snapshot
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookUpdate {
    #[serde(default)]
    pub asset_id: String,
    /// Levels that failed to decode are dropped; a non-array side is empty
    #[serde(default, deserialize_with = "lenient_list")]
    pub bids: Vec<BookLevel>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub asks: Vec<BookLevel>,
    /// Event time in milliseconds, 0 when missing or non-numeric
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: i64,
}

/// Price level in a book snapshot
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookLevel {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub size: Option<Decimal>,
}

/// Batch of per-token partial updates
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceChangeUpdate {
    /// Entries that failed to decode are dropped
    #[serde(default, deserialize_with = "lenient_list")]
    pub price_changes: Vec<PriceChange>,
    /// Event time in milliseconds, 0 when missing or non-numeric
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: i64,
}

/// Partial top-of-book update for one token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceChange {
    #[serde(default)]
    pub asset_id: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub best_bid: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub bid_size: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub best_ask: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub ask_size: Option<Decimal>,
}

/// Decode a text frame into its events
///
/// Fails only when the frame is not JSON at all. Array elements that do not
/// match a known shape are logged and skipped without affecting the rest.
pub fn decode_frame(text: &str) -> Result<Vec<FeedEvent>, serde_json::Error> {
    let items = match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        single => vec![single],
    };

    let mut events = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<FeedEvent>(item) {
            Ok(event) => events.push(event),
            Err(e) => tracing::debug!(error = %e, "Skipping undecodable update"),
        }
    }
    Ok(events)
}

/// Numeric-like JSON value as a decimal
///
/// Accepts numbers and numeric strings (including exponent notation);
/// anything else is `None`.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            parse_decimal(&n.to_string())
        }
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

/// Numeric-like JSON value as integer milliseconds, truncated toward zero
///
/// Non-numeric or out-of-range values map to 0.
pub fn millis_from_value(value: &Value) -> i64 {
    decimal_from_value(value)
        .and_then(|d| d.trunc().to_i64())
        .unwrap_or(0)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_value))
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(millis_from_value).unwrap_or(0))
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            tracing::debug!(value = %other, "Expected an array, treating as empty");
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable entry");
                None
            }
        })
        .collect())
}
