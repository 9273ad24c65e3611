//! Reconnect and backoff behaviour over a scripted transport

use crate::support::{Dial, ScriptedDialer};
use poly_ticker::ws::{
    ConnectionEvent, ConnectionManager, ConnectionState, FrameHandler, WsConfig, WsError,
};
use std::time::Duration;
use tokio::sync::mpsc;

struct Discard;

#[async_trait::async_trait]
impl FrameHandler for Discard {
    async fn on_frame(&mut self, _text: &str) {}
}

fn backoff_delays(events: &[ConnectionEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            ConnectionEvent::Backoff { delay, .. } => Some(delay.as_secs()),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_then_resets_after_subscribe() {
    let (dialer, _sent) = ScriptedDialer::new(vec![
        Dial::Fail,
        Dial::Fail,
        Dial::Fail,
        Dial::Frames(vec![]),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut manager = ConnectionManager::new(
        WsConfig::default(),
        dialer,
        Discard,
        vec!["tok".to_string()],
    )
    .with_events(tx);

    let result = manager.run().await;
    assert!(matches!(result, Err(WsError::MaxReconnectsExceeded(10))));
    assert_eq!(manager.state(), ConnectionState::Closed);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    let subscribed_at = events
        .iter()
        .position(|e| matches!(e, ConnectionEvent::Subscribed { tokens: 1 }))
        .unwrap();
    assert_eq!(backoff_delays(&events[..subscribed_at]), vec![2, 4, 8]);
    assert_eq!(
        events[subscribed_at - 1],
        ConnectionEvent::Dialing { retry: 3 }
    );

    let after = backoff_delays(&events[subscribed_at..]);
    assert_eq!(after[..3], [2, 4, 8]);
    assert_eq!(after.iter().max(), Some(&60));
    assert_eq!(events.last(), Some(&ConnectionEvent::Closed { attempts: 10 }));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_never_exceeds_cap() {
    let (dialer, _sent) = ScriptedDialer::new(vec![]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = WsConfig::default()
        .max_reconnects(8)
        .max_delay(Duration::from_secs(20));
    let mut manager =
        ConnectionManager::new(config, dialer, Discard, vec!["tok".to_string()]).with_events(tx);

    let started = tokio::time::Instant::now();
    let _ = manager.run().await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let delays = backoff_delays(&events);
    assert_eq!(delays, vec![2, 4, 8, 16, 20, 20, 20]);
    assert!(started.elapsed() >= Duration::from_secs(90));
}

#[tokio::test]
async fn test_state_watch_reports_closed() {
    let (dialer, _sent) = ScriptedDialer::new(vec![]);
    let config = WsConfig::default()
        .max_reconnects(1)
        .backoff_base(Duration::from_millis(1));
    let mut manager = ConnectionManager::new(config, dialer, Discard, vec!["tok".to_string()]);
    let state = manager.subscribe_state();

    assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    let _ = manager.run().await;
    assert_eq!(*state.borrow(), ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_session_waits_one_backoff_step() {
    let (dialer, _sent) =
        ScriptedDialer::new(vec![Dial::Frames(vec![]), Dial::Frames(vec![])]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = WsConfig::default().max_reconnects(3);
    let mut manager =
        ConnectionManager::new(config, dialer, Discard, vec!["tok".to_string()]).with_events(tx);

    let started = tokio::time::Instant::now();
    let result = manager.run().await;
    assert!(matches!(result, Err(WsError::MaxReconnectsExceeded(3))));

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(events[0], ConnectionEvent::Dialing { retry: 0 });
    assert_eq!(events[1], ConnectionEvent::Subscribed { tokens: 1 });
    assert!(matches!(events[2], ConnectionEvent::Disconnected { .. }));
    assert_eq!(
        events[3],
        ConnectionEvent::Backoff {
            retry: 1,
            delay: Duration::from_secs(2)
        }
    );
    assert_eq!(events[4], ConnectionEvent::Dialing { retry: 1 });
    assert_eq!(events[5], ConnectionEvent::Subscribed { tokens: 1 });

    // 2s after each drop, then 4s after the failed redial
    assert_eq!(backoff_delays(&events), vec![2, 2, 4]);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9));
}
