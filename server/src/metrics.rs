//! Prometheus exporter installation.

use helpdesk_core::metrics::register_metrics;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build the exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),

    /// Failed to install the global recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and describe the admission metrics.
///
/// # Errors
///
/// Returns [`MetricsError`] if the exporter cannot be built or a global
/// recorder is already installed.
pub fn install() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    // Descriptions attach to the recorder installed above.
    register_metrics();

    tracing::info!("Metrics recorder installed, available at /metrics");
    Ok(handle)
}
