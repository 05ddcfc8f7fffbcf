use std::net::SocketAddr;
use tracing::{info, warn};

pub const METRICS_PORT_ENV: &str = "NIGHTLIST_METRICS_PORT";

// Metric names
pub const FETCH_TOTAL: &str = "nightlist_fetch_total";
pub const FETCH_DURATION_SECONDS: &str = "nightlist_fetch_duration_seconds";
pub const ROWS_SKIPPED_TOTAL: &str = "nightlist_rows_skipped_total";
pub const EVENTS_NORMALIZED_TOTAL: &str = "nightlist_events_normalized_total";
pub const EVENTS_DEDUPLICATED_TOTAL: &str = "nightlist_events_deduplicated_total";
pub const REFRESH_DURATION_SECONDS: &str = "nightlist_refresh_duration_seconds";
pub const SINK_WRITES_TOTAL: &str = "nightlist_sink_writes_total";

/// Install the Prometheus exporter when `NIGHTLIST_METRICS_PORT` is set.
/// Without an exporter the `metrics` macros are no-ops.
pub fn init_metrics() {
    let port: u16 = match std::env::var(METRICS_PORT_ENV).ok().and_then(|s| s.parse().ok()) {
        Some(port) => port,
        None => return,
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}
