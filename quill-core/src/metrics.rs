use std::time::Duration;

use crate::dialect::SqlDialect;
use crate::pool::Pool;

#[cfg(feature = "metrics")]
pub use metrics_exporter_prometheus::PrometheusHandle;

/// Install the Prometheus recorder and return the handle for scraping.
#[cfg(feature = "metrics")]
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Record pool occupancy as gauges.
#[cfg(feature = "metrics")]
pub fn record_pool_stats<DB: SqlDialect>(pool: &Pool<DB>) {
    let inner = pool.inner();
    metrics::gauge!("quill.pool.size", "db" => DB::NAME).set(f64::from(inner.size()));
    metrics::gauge!("quill.pool.idle", "db" => DB::NAME).set(inner.num_idle() as f64);
    metrics::gauge!("quill.pool.max_size", "db" => DB::NAME)
        .set(f64::from(inner.options().get_max_connections()));
}

#[cfg(not(feature = "metrics"))]
pub fn record_pool_stats<DB: SqlDialect>(_pool: &Pool<DB>) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_query<DB: SqlDialect>(operation: &'static str, elapsed: Duration) {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    let labels = [("operation", operation), ("db", DB::NAME)];
    metrics::histogram!("quill.query.duration_ms", &labels).record(elapsed_ms);
    metrics::counter!("quill.query.count", &labels).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_query<DB: SqlDialect>(_operation: &'static str, _elapsed: Duration) {}
