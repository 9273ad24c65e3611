//! End-to-end ingestion: catalog, session, scripted feed, memory sink

use crate::support::{Dial, FixedLookup, ScriptedDialer};
use chrono::DateTime;
use poly_ticker::market::MarketCatalog;
use poly_ticker::session::{Session, SessionConfig};
use poly_ticker::sink::MemorySink;
use poly_ticker::ticker::Ticker;
use poly_ticker::ws::{WsConfig, WsError};
use rust_decimal_macros::dec;
use std::time::Duration;

const SLUG: &str = "eth-updown-15m-1700000100";

fn session_config() -> SessionConfig {
    SessionConfig {
        assets: vec!["eth".to_string(), "btc".to_string()],
        next_market: false,
        ws: WsConfig::default()
            .max_reconnects(1)
            .backoff_base(Duration::from_millis(1)),
    }
}

fn book_frame(token: &str) -> String {
    format!(
        r#"{{"event_type":"book","asset_id":"{token}","market":"0xabc",
            "bids":[{{"price":"0.44","size":"30"}},{{"price":"0.45","size":"100"}}],
            "asks":[{{"price":"0.56","size":"10"}},{{"price":"0.55","size":"80"}}],
            "timestamp":"1700000000123"}}"#
    )
}

fn price_change_frame(token: &str) -> String {
    format!(
        r#"{{"event_type":"price_change","market":"0xabc","timestamp":"1700000000999",
            "price_changes":[{{"asset_id":"{token}","best_bid":"0","best_ask":"0.52"}}]}}"#
    )
}

#[tokio::test]
async fn test_book_then_price_change_reaches_sink() {
    let up = format!("{SLUG}-up");
    let catalog = MarketCatalog::new(FixedLookup {
        slugs: vec![SLUG.to_string()],
    });
    let (dialer, mut sent) = ScriptedDialer::new(vec![Dial::Frames(vec![
        book_frame(&up),
        "PONG".to_string(),
        price_change_frame(&up),
    ])]);
    let sink = MemorySink::new();
    let now = DateTime::from_timestamp(1_700_000_100 + 300, 0).unwrap();

    let mut session = Session::bootstrap(&catalog, &session_config(), now, dialer, sink.clone())
        .await
        .unwrap();
    assert_eq!(session.registry().len(), 2);

    let result = session.run().await;
    assert!(matches!(result, Err(WsError::MaxReconnectsExceeded(1))));

    let subscription: serde_json::Value = serde_json::from_str(&sent.recv().await.unwrap()).unwrap();
    assert_eq!(subscription["type"], "market");
    assert_eq!(
        subscription["assets_ids"],
        serde_json::json!([up.clone(), format!("{SLUG}-down")])
    );

    let ticker: Ticker = sink
        .get_json("ETH_up_15m_polymarket_ticker")
        .await
        .unwrap();
    assert_eq!(ticker.best_bid, dec!(0.45));
    assert_eq!(ticker.bid_size, dec!(100));
    assert_eq!(ticker.best_ask, dec!(0.52));
    assert_eq!(ticker.ask_size, dec!(80));
    assert_eq!(ticker.token_id, up);
    assert_eq!(ticker.slug, SLUG);
    assert_eq!(ticker.ts, 1_700_000_000_999);

    assert_eq!(sink.write_count(), 2);
    assert_eq!(sink.keys().await, vec!["ETH_up_15m_polymarket_ticker"]);
}

#[tokio::test]
async fn test_stored_payload_field_names() {
    let up = format!("{SLUG}-up");
    let catalog = MarketCatalog::new(FixedLookup {
        slugs: vec![SLUG.to_string()],
    });
    let (dialer, _sent) = ScriptedDialer::new(vec![Dial::Frames(vec![book_frame(&up)])]);
    let sink = MemorySink::new();
    let now = DateTime::from_timestamp(1_700_000_100, 0).unwrap();

    let mut session = Session::bootstrap(&catalog, &session_config(), now, dialer, sink.clone())
        .await
        .unwrap();
    let _ = session.run().await;

    let raw: serde_json::Value = sink
        .get_json("ETH_up_15m_polymarket_ticker")
        .await
        .unwrap();
    assert_eq!(raw["bestBid"], 0.45);
    assert_eq!(raw["bidSz"], 100.0);
    assert_eq!(raw["bestAsk"], 0.55);
    assert_eq!(raw["askSz"], 80.0);
    assert_eq!(raw["token_id"], up.as_str());
    assert_eq!(raw["slug"], SLUG);
    assert_eq!(raw["ts"], 1_700_000_000_123i64);
    assert!(raw["ts_sv"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_updates_for_other_slots_are_ignored() {
    let catalog = MarketCatalog::new(FixedLookup {
        slugs: vec![SLUG.to_string()],
    });
    let stale = "eth-updown-15m-1699999200-up";
    let (dialer, _sent) = ScriptedDialer::new(vec![Dial::Frames(vec![
        book_frame(stale),
        price_change_frame(stale),
        "not json".to_string(),
    ])]);
    let sink = MemorySink::new();
    let now = DateTime::from_timestamp(1_700_000_100, 0).unwrap();

    let mut session = Session::bootstrap(&catalog, &session_config(), now, dialer, sink.clone())
        .await
        .unwrap();
    let _ = session.run().await;

    assert!(sink.is_empty().await);
    assert!(session.aggregator().is_empty());
}
