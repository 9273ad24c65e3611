//! Ticker aggregation and publishing

use super::message::{decode_frame, BookLevel, BookUpdate, FeedEvent, PriceChange};
use super::{ticker_key, Ticker};
use crate::market::TokenRegistry;
use crate::sink::TickerSink;
use crate::telemetry::{increment, CounterMetric};
use crate::ws::FrameHandler;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Best bid/ask with sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quote {
    best_bid: Decimal,
    bid_size: Decimal,
    best_ask: Decimal,
    ask_size: Decimal,
}

/// Highest-priced level with positive price and size, or (0, 0)
///
/// A repeated price takes the size of its last occurrence.
pub fn best_bid(levels: &[BookLevel]) -> (Decimal, Decimal) {
    valid_levels(levels).fold((Decimal::ZERO, Decimal::ZERO), |best, (price, size)| {
        if price >= best.0 {
            (price, size)
        } else {
            best
        }
    })
}

/// Lowest-priced level with positive price and size, or (0, 0)
///
/// A repeated price takes the size of its last occurrence.
pub fn best_ask(levels: &[BookLevel]) -> (Decimal, Decimal) {
    valid_levels(levels)
        .fold(None, |best: Option<(Decimal, Decimal)>, (price, size)| match best {
            Some((best_price, _)) if price > best_price => best,
            _ => Some((price, size)),
        })
        .unwrap_or((Decimal::ZERO, Decimal::ZERO))
}

fn valid_levels(levels: &[BookLevel]) -> impl Iterator<Item = (Decimal, Decimal)> + '_ {
    levels.iter().filter_map(|level| match (level.price, level.size) {
        (Some(price), Some(size)) if price > Decimal::ZERO && size > Decimal::ZERO => {
            Some((price, size))
        }
        _ => None,
    })
}

/// Adopt `inbound` when present and non-zero, otherwise keep `prior`
///
/// A genuine zero can not be told apart from "unchanged" here.
pub fn carry_forward(inbound: Option<Decimal>, prior: Decimal) -> Decimal {
    match inbound {
        Some(value) if !value.is_zero() => value,
        _ => prior,
    }
}

/// Maintains per-token tickers for one session and publishes every change
///
/// The read loop is the only caller, so the ticker map needs no locking.
pub struct TickerAggregator<S> {
    registry: TokenRegistry,
    tickers: HashMap<String, Ticker>,
    sink: S,
}

impl<S: TickerSink> TickerAggregator<S> {
    pub fn new(registry: TokenRegistry, sink: S) -> Self {
        Self {
            registry,
            tickers: HashMap::new(),
            sink,
        }
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Current ticker for a token, if any update has been applied
    pub fn ticker(&self, token_id: &str) -> Option<&Ticker> {
        self.tickers.get(token_id)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Decode a text frame and apply each event in order
    ///
    /// Returns the number of tickers written. Malformed frames are dropped.
    pub async fn handle_frame(&mut self, text: &str) -> usize {
        tracing::trace!(
            msg_len = text.len(),
            preview = %text.chars().take(200).collect::<String>(),
            "Received market message"
        );

        let events = match decode_frame(text) {
            Ok(events) => events,
            Err(e) => {
                increment(CounterMetric::FramesDropped);
                tracing::warn!(
                    error = %e,
                    msg_preview = %text.chars().take(100).collect::<String>(),
                    "Failed to parse market message"
                );
                return 0;
            }
        };

        let mut written = 0;
        for event in events {
            written += self.apply(event).await;
        }
        written
    }

    /// Apply one event; returns the number of tickers written
    pub async fn apply(&mut self, event: FeedEvent) -> usize {
        match event {
            FeedEvent::Book(book) => usize::from(self.apply_book(book).await),
            FeedEvent::PriceChange(update) => {
                let mut written = 0;
                for change in update.price_changes {
                    if self.apply_price_change(change, update.timestamp).await {
                        written += 1;
                    }
                }
                written
            }
            FeedEvent::Unknown => 0,
        }
    }

    /// Full snapshot: both sides are recomputed and overwrite prior values
    async fn apply_book(&mut self, book: BookUpdate) -> bool {
        if !self.registry.contains(&book.asset_id) {
            tracing::trace!(token_id = %book.asset_id, "Book for untracked token");
            return false;
        }

        let (best_bid, bid_size) = best_bid(&book.bids);
        let (best_ask, ask_size) = best_ask(&book.asks);
        let quote = Quote {
            best_bid,
            bid_size,
            best_ask,
            ask_size,
        };

        self.publish(&book.asset_id, quote, book.timestamp).await
    }

    /// Delta: each field is carried forward independently when zero or absent
    async fn apply_price_change(&mut self, change: PriceChange, timestamp: i64) -> bool {
        if !self.registry.contains(&change.asset_id) {
            tracing::trace!(token_id = %change.asset_id, "Price change for untracked token");
            return false;
        }

        let prior = self
            .tickers
            .get(&change.asset_id)
            .map(|t| Quote {
                best_bid: t.best_bid,
                bid_size: t.bid_size,
                best_ask: t.best_ask,
                ask_size: t.ask_size,
            })
            .unwrap_or(Quote {
                best_bid: Decimal::ZERO,
                bid_size: Decimal::ZERO,
                best_ask: Decimal::ZERO,
                ask_size: Decimal::ZERO,
            });

        let quote = Quote {
            best_bid: carry_forward(change.best_bid, prior.best_bid),
            bid_size: carry_forward(change.bid_size, prior.bid_size),
            best_ask: carry_forward(change.best_ask, prior.best_ask),
            ask_size: carry_forward(change.ask_size, prior.ask_size),
        };

        self.publish(&change.asset_id, quote, timestamp).await
    }

    /// Stamp the ticker and write it to the sink; false when the write failed
    async fn publish(&mut self, token_id: &str, quote: Quote, timestamp: i64) -> bool {
        let Some(entry) = self.registry.get(token_id) else {
            return false;
        };
        let key = ticker_key(&entry.market, &entry.outcome);

        let ticker = self
            .tickers
            .entry(token_id.to_string())
            .or_insert_with(|| Ticker::new(token_id));
        ticker.best_bid = quote.best_bid;
        ticker.bid_size = quote.bid_size;
        ticker.best_ask = quote.best_ask;
        ticker.ask_size = quote.ask_size;
        ticker.slug.clone_from(&entry.market.slug);
        ticker.ts = timestamp;
        ticker.ts_sv = Utc::now().timestamp_millis();

        let payload = match serde_json::to_vec(ticker) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, token_id, "Failed to serialize ticker");
                return false;
            }
        };

        tracing::debug!(
            key = %key,
            best_bid = %quote.best_bid,
            best_ask = %quote.best_ask,
            "Publishing ticker"
        );

        match self.sink.set(&key, payload).await {
            Ok(()) => {
                increment(CounterMetric::TickerWrites);
                true
            }
            Err(e) => {
                increment(CounterMetric::SinkErrors);
                tracing::warn!(error = %e, key = %key, "Failed to write ticker");
                false
            }
        }
    }
}

#[async_trait]
impl<S: TickerSink> FrameHandler for TickerAggregator<S> {
    async fn on_frame(&mut self, text: &str) {
        self.handle_frame(text).await;
    }
}
