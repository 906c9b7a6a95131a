//! Logging and Prometheus metrics setup.
//!
//! Metric names recorded by the application:
//! - `duckai_responses_total{source}`: replies served, by `local` or `internet`
//! - `duckai_scenarios_learned_total`: scenarios added through the learn endpoint
//! - `duckai_scenarios_loaded`: size of the in-memory scenario set

use metrics_exporter_prometheus::PrometheusBuilder;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::domain::ConfigError;

/// Prometheus handle for on-demand scrape output (e.g. GET /metrics).
pub type PrometheusHandle = metrics_exporter_prometheus::PrometheusHandle;

const DEFAULT_FILTER: &str = "info,mkd_duck_ai=debug,tower_http=info";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                message: format!("expected 'pretty' or 'json', got '{other}'"),
            }),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is a no-op.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
}

/// Install the global metrics recorder and return a handle for rendering.
///
/// Uses `PrometheusBuilder` without an HTTP listener; the application
/// exposes metrics via GET /metrics using `handle.render()`.
///
/// # Errors
/// Returns an error if a recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

/// Convenience to wrap the handle in Arc for shared use in app state.
#[must_use]
pub fn init_metrics_handle() -> Option<Arc<PrometheusHandle>> {
    init_metrics().ok().map(Arc::new)
}

fn describe_metrics() {
    metrics::describe_counter!(
        "duckai_responses_total",
        "Replies served, labelled by source"
    );
    metrics::describe_counter!(
        "duckai_scenarios_learned_total",
        "Scenarios added through the learn endpoint"
    );
    metrics::describe_gauge!(
        "duckai_scenarios_loaded",
        "Scenarios currently held in memory"
    );
}
