//! Token registry for one session

use super::Market;
use std::collections::HashMap;
use std::sync::Arc;

/// The market and outcome a token belongs to
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub market: Arc<Market>,
    pub outcome: String,
}

/// Token identifier to (market, outcome) mapping
///
/// Built once per session from the resolved markets and never patched; a
/// rollover builds a new registry.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    entries: HashMap<String, RegistryEntry>,
    token_ids: Vec<String>,
    markets: Vec<Arc<Market>>,
}

impl TokenRegistry {
    /// Build a registry from resolved markets
    ///
    /// Tokens without an outcome label are skipped. A token already claimed
    /// by an earlier market keeps its first owner.
    pub fn from_markets(markets: Vec<Market>) -> Self {
        let mut registry = Self::default();

        for market in markets {
            let market = Arc::new(market);
            for token_id in &market.token_ids {
                let Some(outcome) = market.outcome_for(token_id) else {
                    tracing::debug!(token_id = %token_id, slug = %market.slug, "Token has no outcome label, skipping");
                    continue;
                };
                if registry.entries.contains_key(token_id) {
                    tracing::warn!(token_id = %token_id, slug = %market.slug, "Token already registered to another market");
                    continue;
                }
                registry.entries.insert(
                    token_id.clone(),
                    RegistryEntry {
                        market: Arc::clone(&market),
                        outcome: outcome.to_string(),
                    },
                );
                registry.token_ids.push(token_id.clone());
            }
            registry.markets.push(market);
        }

        tracing::info!(tokens = registry.token_ids.len(), markets = registry.markets.len(), "Built token registry");
        registry
    }

    pub fn get(&self, token_id: &str) -> Option<&RegistryEntry> {
        self.entries.get(token_id)
    }

    pub fn contains(&self, token_id: &str) -> bool {
        self.entries.contains_key(token_id)
    }

    /// Token identifiers in market order, as sent in the subscription
    pub fn token_ids(&self) -> &[String] {
        &self.token_ids
    }

    pub fn markets(&self) -> &[Arc<Market>] {
        &self.markets
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
