//! Prometheus metrics module

use crate::error::NsqError;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;

/// Pool metrics collector
#[derive(Clone)]
pub struct PoolMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PoolMetrics {
    /// Install the global Prometheus recorder and return a handle
    ///
    /// Only one recorder can be installed per process.
    pub fn install() -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        Self::register_metrics();

        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    /// Register metric descriptions
    fn register_metrics() {
        describe_counter!(
            "nsq_pool_lookups_total",
            Unit::Count,
            "Registry lookups by result (hit or miss)"
        );
        describe_counter!(
            "nsq_pool_shuffles_total",
            Unit::Count,
            "Times the pool order was randomized"
        );
        describe_counter!(
            "nsq_pool_connect_errors_total",
            Unit::Count,
            "Failed NSQD connect attempts"
        );

        describe_histogram!(
            "nsq_pool_connect_duration_seconds",
            Unit::Seconds,
            "Time to open an NSQD socket"
        );

        describe_gauge!(
            "nsq_pool_connections",
            Unit::Count,
            "Connections registered in the pool"
        );
        describe_gauge!(
            "nsq_pool_connections_ready",
            Unit::Count,
            "Connections with an open socket"
        );
    }

    /// Record a registry lookup
    pub fn record_lookup(&self, hit: bool) {
        counter!(
            "nsq_pool_lookups_total",
            "result" => if hit { "hit" } else { "miss" }
        )
        .increment(1);
    }

    pub fn record_shuffle(&self) {
        counter!("nsq_pool_shuffles_total").increment(1);
    }

    /// Record a successful connect
    pub fn record_connect(&self, address: &str, duration: Duration) {
        histogram!(
            "nsq_pool_connect_duration_seconds",
            "address" => address.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Record a failed connect
    pub fn record_connect_error(&self, address: &str, error: &NsqError) {
        counter!(
            "nsq_pool_connect_errors_total",
            "address" => address.to_string(),
            "error_type" => error.error_type_label()
        )
        .increment(1);
    }

    pub fn set_connections(&self, count: usize) {
        gauge!("nsq_pool_connections").set(count as f64);
    }

    pub fn set_connections_ready(&self, count: usize) {
        gauge!("nsq_pool_connections_ready").set(count as f64);
    }

    /// Render metrics in Prometheus format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
