//! Prometheus metrics infrastructure
//!
//! This module provides the bootstrap for the Prometheus metrics exporter.
//! Engine-level counters live with the allocation engine itself; this
//! exporter makes anything recorded through the `metrics` facade scrapeable.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP listener on the specified port that exposes metrics
/// at the `/metrics` endpoint.
///
/// # Arguments
///
/// * `port` - Port to expose metrics on
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record the outcome of one allocation pass on the global metrics facade.
pub fn record_allocation_pass(orders_fulfilled: u64, doses_allocated: u64) {
    metrics::counter!("vaxdist_allocation_passes_total").increment(1);
    metrics::counter!("vaxdist_orders_fulfilled_total").increment(orders_fulfilled);
    metrics::counter!("vaxdist_doses_allocated_total").increment(doses_allocated);
}

/// Record the outcome of one expiry sweep on the global metrics facade.
pub fn record_expiry_sweep(orders_expired: u64) {
    metrics::counter!("vaxdist_expiry_sweeps_total").increment(1);
    metrics::counter!("vaxdist_orders_expired_total").increment(orders_expired);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_does_not_panic() {
        // The metrics facade is a no-op until an exporter is installed.
        record_allocation_pass(3, 120);
        record_expiry_sweep(1);
    }
}
