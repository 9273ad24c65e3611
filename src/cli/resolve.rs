//! Resolve command implementation

use crate::config::Config;
use crate::market::{slot_start, GammaClient, MarketCatalog, TokenRegistry};
use crate::ticker::ticker_key;
use chrono::{DateTime, Utc};
use clap::Args;
use serde_json::{json, Value};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Asset symbols to resolve, overriding the config (e.g., btc,eth)
    #[arg(short, long, value_delimiter = ',')]
    pub assets: Option<Vec<String>>,

    /// Resolve the upcoming slot instead of the current one
    #[arg(short, long)]
    pub next: bool,
}

impl ResolveArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let assets = self
            .assets
            .clone()
            .unwrap_or_else(|| config.market.assets.clone());

        let catalog = MarketCatalog::new(GammaClient::with_config(config.gamma_config())?);
        let current = slot_start(Utc::now());
        let (markets, slot) = if self.next || config.market.next_market {
            catalog.resolve_next(&assets, current).await
        } else {
            catalog.resolve(&assets, current).await
        };

        let registry = TokenRegistry::from_markets(markets);
        println!("{}", serde_json::to_string_pretty(&registry_report(&registry, slot))?);
        Ok(())
    }
}

/// JSON view of a registry: each market with its tokens and cache keys
fn registry_report(registry: &TokenRegistry, slot: DateTime<Utc>) -> Value {
    let markets: Vec<Value> = registry
        .markets()
        .iter()
        .map(|market| {
            let tokens: Vec<Value> = market
                .token_ids
                .iter()
                .filter_map(|token_id| {
                    let entry = registry.get(token_id)?;
                    if entry.market.slug != market.slug {
                        return None;
                    }
                    Some(json!({
                        "token_id": token_id,
                        "outcome": entry.outcome,
                        "key": ticker_key(market, &entry.outcome),
                    }))
                })
                .collect();
            json!({
                "slug": market.slug,
                "question": market.question,
                "condition_id": market.condition_id,
                "end_date": market.end_date,
                "tokens": tokens,
            })
        })
        .collect();

    json!({
        "slot": slot.timestamp(),
        "markets": markets,
    })
}
