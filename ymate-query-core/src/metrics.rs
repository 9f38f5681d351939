use std::time::Duration;

#[cfg(feature = "metrics")]
pub use metrics_exporter_prometheus::PrometheusHandle;

/// Records `ymate_query.duration_ms` and `ymate_query.count` for one statement.
#[cfg(feature = "metrics")]
pub(crate) fn record_query_metrics(operation: &str, database: &str, elapsed: Duration) {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    let labels = [
        ("operation", operation.to_owned()),
        ("database", database.to_owned()),
    ];
    ::metrics::histogram!("ymate_query.duration_ms", &labels).record(elapsed_ms);
    ::metrics::counter!("ymate_query.count", &labels).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_query_metrics(_operation: &str, _database: &str, _elapsed: Duration) {}

/// Install the Prometheus recorder and return the handle for scraping.
#[cfg(feature = "metrics")]
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Record pool size, idle connections and the configured maximum as gauges.
#[cfg(feature = "metrics")]
pub fn record_pool_stats<DB: sqlx::Database>(pool: &sqlx::Pool<DB>, data_source: &str) {
    let data_source = data_source.to_owned();
    ::metrics::gauge!("ymate_query.pool.size", "data_source" => data_source.clone())
        .set(f64::from(pool.size()));
    ::metrics::gauge!("ymate_query.pool.idle", "data_source" => data_source.clone())
        .set(pool.num_idle() as f64);
    ::metrics::gauge!("ymate_query.pool.max_size", "data_source" => data_source)
        .set(f64::from(pool.options().get_max_connections()));
}
