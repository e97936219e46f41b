//! Telemetry and logging infrastructure
//!
//! Structured logging with tracing, pipeline counters, and the single hook
//! every caught collaborator failure is routed through.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig};
pub use metrics::{ChannelStats, FailureSource, MetricsSnapshot, PipelineMetrics};

/// Record a caught failure. The caller degrades and carries on.
pub fn report_failure(metrics: &PipelineMetrics, source: FailureSource, error: &dyn std::fmt::Display) {
    metrics.record_failure(source);
    tracing::warn!(target: "cheese_vision::failure", %source, %error, "Collaborator call failed; continuing");
}
