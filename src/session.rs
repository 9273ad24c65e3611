//! One slot's ingestion session
//!
//! Resolution, a fresh token registry, the aggregator, and the connection
//! manager that feeds it. A rollover builds a new session; nothing here is
//! patched in place.

use crate::market::{slot_start, MarketCatalog, MarketLookup, TokenRegistry};
use crate::sink::TickerSink;
use crate::telemetry::{set_gauge, GaugeMetric};
use crate::ticker::TickerAggregator;
use crate::ws::{ConnectionEvent, ConnectionManager, ConnectionState, Dialer, WsConfig, WsError};
use anyhow::bail;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Asset symbols to resolve (e.g., "btc")
    pub assets: Vec<String>,
    /// Resolve the slot after the current one
    pub next_market: bool,
    pub ws: WsConfig,
}

/// Running pairing of registry, aggregator, and connection
pub struct Session<D, S> {
    slot: DateTime<Utc>,
    manager: ConnectionManager<D, TickerAggregator<S>>,
}

impl<D: Dialer, S: TickerSink> Session<D, S> {
    /// Resolve the markets for `now`'s slot (or the next one) and wire up a session
    ///
    /// Fails when no market could be resolved.
    pub async fn bootstrap<L: MarketLookup>(
        catalog: &MarketCatalog<L>,
        config: &SessionConfig,
        now: DateTime<Utc>,
        dialer: D,
        sink: S,
    ) -> anyhow::Result<Self> {
        let current = slot_start(now);
        let (markets, slot) = if config.next_market {
            catalog.resolve_next(&config.assets, current).await
        } else {
            catalog.resolve(&config.assets, current).await
        };

        if markets.is_empty() {
            bail!("No markets resolved for slot {}", slot.timestamp());
        }

        let registry = TokenRegistry::from_markets(markets);
        set_gauge(GaugeMetric::ActiveMarkets, registry.markets().len() as f64);
        set_gauge(GaugeMetric::TrackedTokens, registry.len() as f64);

        let token_ids = registry.token_ids().to_vec();
        let aggregator = TickerAggregator::new(registry, sink);
        let manager = ConnectionManager::new(config.ws.clone(), dialer, aggregator, token_ids);

        tracing::info!(
            slot = slot.timestamp(),
            markets = manager.handler().registry().markets().len(),
            tokens = manager.handler().registry().len(),
            "Session ready"
        );

        Ok(Self { slot, manager })
    }

    /// Forward connection lifecycle events to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        self.manager = self.manager.with_events(tx);
        self
    }

    /// Start of the slot this session serves
    pub fn slot(&self) -> DateTime<Utc> {
        self.slot
    }

    pub fn registry(&self) -> &TokenRegistry {
        self.manager.handler().registry()
    }

    pub fn aggregator(&self) -> &TickerAggregator<S> {
        self.manager.handler()
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.manager.subscribe_state()
    }

    /// Stream until the reconnect budget is exhausted
    pub async fn run(&mut self) -> Result<(), WsError> {
        self.manager.run().await
    }
}
