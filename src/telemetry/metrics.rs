//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Text frames handed to the aggregator
    FramesReceived,
    /// Frames that failed to decode
    FramesDropped,
    /// Ticker snapshots written to the sink
    TickerWrites,
    /// Failed sink writes
    SinkErrors,
    /// Failed dials
    DialFailures,
    /// Sessions torn down after subscribing
    Disconnects,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Tokens in the active registry
    TrackedTokens,
    /// Markets resolved for the active slot
    ActiveMarkets,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::FramesReceived => "polyticker_frames_received_total",
            CounterMetric::FramesDropped => "polyticker_frames_dropped_total",
            CounterMetric::TickerWrites => "polyticker_ticker_writes_total",
            CounterMetric::SinkErrors => "polyticker_sink_errors_total",
            CounterMetric::DialFailures => "polyticker_dial_failures_total",
            CounterMetric::Disconnects => "polyticker_disconnects_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::TrackedTokens => "polyticker_tracked_tokens",
            GaugeMetric::ActiveMarkets => "polyticker_active_markets",
        }
    }
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Serve the Prometheus scrape endpoint on `port`
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to init metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
