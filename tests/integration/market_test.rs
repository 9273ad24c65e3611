//! Market resolution and registry construction

use crate::support::{up_down_market, FixedLookup};
use chrono::{DateTime, TimeZone, Utc};
use poly_ticker::market::{market_slug, slot_start, MarketCatalog, TokenRegistry};
use poly_ticker::ticker::ticker_key;

fn assets(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_slot_and_slug() {
    let now = Utc.with_ymd_and_hms(2023, 11, 14, 22, 14, 20).unwrap();
    let slot = slot_start(now);
    assert_eq!(slot, Utc.with_ymd_and_hms(2023, 11, 14, 22, 0, 0).unwrap());
    assert_eq!(market_slug("BTC", slot), format!("btc-updown-15m-{}", slot.timestamp()));
}

#[tokio::test]
async fn test_catalog_to_registry() {
    let slot = DateTime::from_timestamp(1_700_000_100, 0).unwrap();
    let catalog = MarketCatalog::new(FixedLookup {
        slugs: vec![
            "btc-updown-15m-1700000100".to_string(),
            "xrp-updown-15m-1700000100".to_string(),
        ],
    });

    let (markets, achieved) = catalog
        .resolve(&assets(&["btc", "eth", "sol", "xrp"]), slot)
        .await;
    assert_eq!(achieved, slot);
    assert_eq!(markets.len(), 2);

    let registry = TokenRegistry::from_markets(markets);
    assert_eq!(registry.len(), 4);
    assert_eq!(
        registry.token_ids(),
        &[
            "btc-updown-15m-1700000100-up",
            "btc-updown-15m-1700000100-down",
            "xrp-updown-15m-1700000100-up",
            "xrp-updown-15m-1700000100-down",
        ]
    );

    let entry = registry.get("xrp-updown-15m-1700000100-down").unwrap();
    assert_eq!(
        ticker_key(&entry.market, &entry.outcome),
        "XRP_down_15m_polymarket_ticker"
    );
}

#[test]
fn test_registry_shares_market_between_outcomes() {
    let registry = TokenRegistry::from_markets(vec![up_down_market("sol-updown-15m-1")]);
    let up = registry.get("sol-updown-15m-1-up").unwrap();
    let down = registry.get("sol-updown-15m-1-down").unwrap();
    assert!(std::sync::Arc::ptr_eq(&up.market, &down.market));
    assert_eq!(up.market.asset(), "SOL");
}
