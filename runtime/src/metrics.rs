//! Metrics for the store runtime and remote calls.
//!
//! Recording goes through the `metrics` facade, so it is a no-op until a
//! recorder is installed. [`MetricsRegistry::install`] installs a Prometheus
//! recorder whose output can be rendered on demand.
//!
//! # Example
//!
//! ```rust,no_run
//! use todomvc_runtime::metrics::{MetricsRegistry, RemoteMetrics};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = MetricsRegistry::new();
//! registry.install()?;
//!
//! RemoteMetrics::record_call("list", Duration::from_millis(12), true);
//! println!("{}", registry.render().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics recorder
    #[error("Failed to build metrics recorder: {0}")]
    Build(String),
    /// Failed to install metrics recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Prometheus recorder installed as the global `metrics` recorder.
#[derive(Default)]
pub struct MetricsRegistry {
    handle: Option<PrometheusHandle>,
}

impl MetricsRegistry {
    /// Create a registry without installing anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the recorder cannot be built or installed. A recorder
    /// that is already installed (common in tests) is not an error; the
    /// registry then has no handle to render from.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                register_metrics();
                self.handle = Some(handle);
                tracing::debug!("Prometheus recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the Prometheus handle.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this registry did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!("store_actions_total", "Total number of actions reduced by the store");
    describe_histogram!(
        "store_reducer_duration_seconds",
        "Time spent inside the reducer per action"
    );
    describe_counter!(
        "store_effects_executed_total",
        "Total number of effects started, labelled by kind"
    );
    describe_counter!(
        "store_effects_cancelled_total",
        "Total number of cancellable effects aborted"
    );

    describe_counter!(
        "remote_calls_total",
        "Remote collection calls, labelled by operation and outcome"
    );
    describe_histogram!(
        "remote_call_duration_seconds",
        "Latency of remote collection calls"
    );
}

/// Store runtime metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record one reduced action.
    pub fn record_action(duration: Duration) {
        counter!("store_actions_total").increment(1);
        histogram!("store_reducer_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record an effect being started.
    pub fn record_effect(kind: &'static str) {
        counter!("store_effects_executed_total", "kind" => kind).increment(1);
    }

    /// Record a cancelled effect.
    pub fn record_cancellation() {
        counter!("store_effects_cancelled_total").increment(1);
    }
}

/// Remote collection call recorder.
pub struct RemoteMetrics;

impl RemoteMetrics {
    /// Record a finished remote call.
    pub fn record_call(operation: &'static str, duration: Duration, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        counter!("remote_calls_total", "operation" => operation, "outcome" => outcome).increment(1);
        histogram!("remote_call_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_registry_starts_without_handle() {
        let registry = MetricsRegistry::new();
        assert!(registry.handle().is_none());
        assert!(registry.render().is_none());
    }

    #[test]
    fn test_install_and_render() {
        let mut registry = MetricsRegistry::new();
        registry.install().unwrap();

        StoreMetrics::record_action(Duration::from_micros(40));
        StoreMetrics::record_effect("future");
        RemoteMetrics::record_call("delete", Duration::from_millis(3), false);

        // Another test may have installed the recorder first; recording still works.
        if let Some(rendered) = registry.render() {
            assert!(rendered.contains("store_actions_total"));
            assert!(rendered.contains("remote_calls_total"));
        }
    }
}
