//! Market discovery module
//!
//! Resolves the 15-minute up/down markets for a slot via the Gamma API and
//! builds the token registry a session subscribes with.

mod catalog;
mod gamma;
mod registry;

pub use catalog::{market_slug, slot_start, MarketCatalog, SLOT_MINUTES};
pub use gamma::{GammaClient, GammaConfig, LookupError, GAMMA_API_URL};
pub use registry::{RegistryEntry, TokenRegistry};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resolved Polymarket market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Gamma market identifier
    pub id: String,
    /// Unique condition identifier
    pub condition_id: String,
    /// Market question
    pub question: String,
    /// Market slug (e.g., "btc-updown-15m-1767638700")
    pub slug: String,
    /// CLOB token identifiers, in outcome order
    pub token_ids: Vec<String>,
    /// Outcome labels (e.g., ["Up", "Down"])
    pub outcomes: Vec<String>,
    /// Token identifier to outcome label; tokens past the end of `outcomes` are absent
    pub token_outcomes: HashMap<String, String>,
    /// End date, midnight UTC of the listed day
    pub end_date: Option<DateTime<Utc>>,
}

impl Market {
    /// Outcome label for one of this market's tokens
    pub fn outcome_for(&self, token_id: &str) -> Option<&str> {
        self.token_outcomes.get(token_id).map(String::as_str)
    }

    /// Upper-cased asset symbol, the first hyphen-delimited segment of the slug
    pub fn asset(&self) -> String {
        self.slug
            .split('-')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }
}

/// Looks up a single market by slug
#[async_trait]
pub trait MarketLookup: Send + Sync {
    async fn market_by_slug(&self, slug: &str) -> Result<Market, LookupError>;
}
