//! Gamma API client for market lookup by slug
//!
//! The Gamma market payload encodes `clobTokenIds` and `outcomes` as JSON
//! strings holding arrays, so both are decoded a second time and zipped
//! positionally into the token to outcome mapping.

use super::{Market, MarketLookup};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Reasons a market is treated as not yet available
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport-level failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status
    #[error("Gamma API returned status {0}")]
    Status(u16),
    /// Response body is not a market object
    #[error("Invalid market JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// An encoded array field is missing
    #[error("Missing {0}")]
    MissingField(&'static str),
    /// An encoded array field does not hold a string array
    #[error("Failed to parse {field}: {source}")]
    EncodedField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Market lists no tokens
    #[error("Market has no tokens")]
    NoTokens,
}

/// Configuration for the Gamma client
#[derive(Debug, Clone)]
pub struct GammaConfig {
    /// Base URL for the Gamma API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: GAMMA_API_URL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: GammaConfig,
    client: Client,
}

impl GammaClient {
    /// Create a new client with custom configuration
    pub fn with_config(config: GammaConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("poly-ticker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl MarketLookup for GammaClient {
    async fn market_by_slug(&self, slug: &str) -> Result<Market, LookupError> {
        let url = format!("{}/markets/slug/{}", self.config.base_url, slug);

        tracing::debug!(url = %url, "Fetching market from Gamma API");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_market(&body)
    }
}

/// Raw market response from Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    #[serde(default)]
    id: String,
    #[serde(default)]
    condition_id: String,
    #[serde(default)]
    question: String,
    #[serde(default)]
    slug: String,
    /// JSON string, e.g. "[\"123\", \"456\"]"
    clob_token_ids: Option<String>,
    /// JSON string, e.g. "[\"Up\", \"Down\"]"
    outcomes: Option<String>,
    /// Date only, e.g. "2025-01-15"
    end_date_iso: Option<String>,
}

/// Parse a Gamma market body into a [`Market`]
pub(crate) fn parse_market(body: &str) -> Result<Market, LookupError> {
    let raw: GammaMarket = serde_json::from_str(body).map_err(LookupError::InvalidJson)?;

    let token_ids = decode_string_list("clobTokenIds", raw.clob_token_ids.as_deref())?;
    let outcomes = decode_string_list("outcomes", raw.outcomes.as_deref())?;

    if token_ids.is_empty() {
        return Err(LookupError::NoTokens);
    }

    let token_outcomes: HashMap<String, String> = token_ids
        .iter()
        .cloned()
        .zip(outcomes.iter().cloned())
        .collect();

    let end_date = raw.end_date_iso.as_deref().and_then(parse_end_date);

    Ok(Market {
        id: raw.id,
        condition_id: raw.condition_id,
        question: raw.question,
        slug: raw.slug,
        token_ids,
        outcomes,
        token_outcomes,
        end_date,
    })
}

fn decode_string_list(field: &'static str, raw: Option<&str>) -> Result<Vec<String>, LookupError> {
    let raw = raw.ok_or(LookupError::MissingField(field))?;
    serde_json::from_str(raw).map_err(|source| LookupError::EncodedField { field, source })
}

fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}
