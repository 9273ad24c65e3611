//! Slot-based market resolution

use super::{Market, MarketLookup};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Width of one market generation
pub const SLOT_MINUTES: i64 = 15;

/// Floor `now` to the start of its 15-minute slot
pub fn slot_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let width = SLOT_MINUTES * 60;
    let secs = now.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(width), 0).unwrap_or(now)
}

/// Canonical slug for an asset's market in `slot`
pub fn market_slug(asset: &str, slot: DateTime<Utc>) -> String {
    format!("{}-updown-15m-{}", asset.to_lowercase(), slot.timestamp())
}

/// Resolves asset symbols into the markets of a slot
pub struct MarketCatalog<L> {
    lookup: L,
}

impl<L: MarketLookup> MarketCatalog<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolve each asset's market for `slot`
    ///
    /// Assets whose market is not available are logged and skipped, so the
    /// result may be any subset of `assets`. Deciding whether a partial set is
    /// usable is up to the caller.
    pub async fn resolve(
        &self,
        assets: &[String],
        slot: DateTime<Utc>,
    ) -> (Vec<Market>, DateTime<Utc>) {
        let mut seen = HashSet::new();
        let mut markets = Vec::new();

        for asset in assets {
            if !seen.insert(asset.to_lowercase()) {
                continue;
            }
            let slug = market_slug(asset, slot);
            match self.lookup.market_by_slug(&slug).await {
                Ok(market) => {
                    tracing::info!(slug = %slug, tokens = market.token_ids.len(), "Resolved market");
                    markets.push(market);
                }
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "Market not yet available");
                }
            }
        }

        (markets, slot)
    }

    /// Resolve the slot after `slot`
    pub async fn resolve_next(
        &self,
        assets: &[String],
        slot: DateTime<Utc>,
    ) -> (Vec<Market>, DateTime<Utc>) {
        self.resolve(assets, slot + Duration::minutes(SLOT_MINUTES))
            .await
    }
}
