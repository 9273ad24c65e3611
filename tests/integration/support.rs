//! Scripted transport and market lookup shared by the integration tests

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use poly_ticker::market::{LookupError, Market, MarketLookup};
use poly_ticker::ws::{Dialer, FrameSink, FrameStream, WsError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Outcome of one dial
pub enum Dial {
    /// Refuse the connection
    Fail,
    /// Deliver these frames, then end the stream
    Frames(Vec<String>),
}

/// Dialer that replays a fixed script; refuses once the script runs out
#[derive(Clone)]
pub struct ScriptedDialer {
    script: Arc<Mutex<VecDeque<Dial>>>,
    sent: mpsc::UnboundedSender<String>,
}

impl ScriptedDialer {
    pub fn new(script: Vec<Dial>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sent, rx) = mpsc::unbounded_channel();
        let dialer = Self {
            script: Arc::new(Mutex::new(script.into())),
            sent,
        };
        (dialer, rx)
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, _url: &str) -> Result<(FrameSink, FrameStream), WsError> {
        let next = self.script.lock().unwrap().pop_front();
        let frames = match next {
            Some(Dial::Frames(frames)) => frames,
            Some(Dial::Fail) | None => {
                return Err(WsError::ConnectionFailed("refused".to_string()))
            }
        };

        let sink = futures_util::sink::unfold(self.sent.clone(), |tx, msg: Message| async move {
            if let Message::Text(text) = msg {
                let _ = tx.send(text);
            }
            Ok::<_, WsError>(tx)
        });
        let stream = stream::iter(frames).map(|f| Ok::<_, WsError>(Message::Text(f)));

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

/// Lookup answering with an up/down market for every listed slug
pub struct FixedLookup {
    pub slugs: Vec<String>,
}

#[async_trait]
impl MarketLookup for FixedLookup {
    async fn market_by_slug(&self, slug: &str) -> Result<Market, LookupError> {
        if !self.slugs.iter().any(|s| s == slug) {
            return Err(LookupError::Status(404));
        }
        Ok(up_down_market(slug))
    }
}

/// Market with tokens `{slug}-up` and `{slug}-down`
pub fn up_down_market(slug: &str) -> Market {
    let up = format!("{slug}-up");
    let down = format!("{slug}-down");
    Market {
        id: slug.to_string(),
        condition_id: format!("0x{slug}"),
        question: format!("{slug} up or down?"),
        slug: slug.to_string(),
        token_ids: vec![up.clone(), down.clone()],
        outcomes: vec!["Up".to_string(), "Down".to_string()],
        token_outcomes: HashMap::from([(up, "Up".to_string()), (down, "Down".to_string())]),
        end_date: None,
    }
}
