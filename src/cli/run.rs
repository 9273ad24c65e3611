//! Run command implementation

use crate::config::{Config, SinkBackend};
use crate::market::{GammaClient, MarketCatalog};
use crate::session::Session;
use crate::sink::{MemorySink, RedisSink, TickerSink};
use crate::ws::TungsteniteDialer;
use anyhow::Context;
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Asset symbols to track, overriding the config (e.g., btc,eth)
    #[arg(short, long, value_delimiter = ',')]
    pub assets: Option<Vec<String>>,

    /// Track the upcoming slot instead of the current one
    #[arg(short, long)]
    pub next: bool,

    /// Sink backend, overriding the config
    #[arg(short, long, value_enum)]
    pub sink: Option<SinkBackend>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut session_config = config.session_config();
        if let Some(assets) = &self.assets {
            session_config.assets = assets.clone();
        }
        session_config.next_market |= self.next;

        let sink: Arc<dyn TickerSink> = match self.sink.unwrap_or(config.sink.backend) {
            SinkBackend::Redis => Arc::new(
                RedisSink::connect(&config.sink.redis_url)
                    .await
                    .context("Failed to connect to Redis")?,
            ),
            SinkBackend::Memory => {
                tracing::info!("Using in-memory sink, tickers will not leave this process");
                Arc::new(MemorySink::new())
            }
        };

        let gamma = GammaClient::with_config(config.gamma_config())?;
        let catalog = MarketCatalog::new(gamma);

        let mut session =
            Session::bootstrap(&catalog, &session_config, Utc::now(), TungsteniteDialer, sink)
                .await?;

        tokio::select! {
            result = session.run() => {
                result.context("Feed session ended")?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
        }

        Ok(())
    }
}
