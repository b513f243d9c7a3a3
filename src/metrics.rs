//! Diagnostics sink for gesture metrics.

use log::info;
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricsAction {
    /// A pickup gesture woke the ambient display. Subtype is the gesture subtype.
    AmbientGesture,
}

/// Fire-and-forget action recorder. Must never fail the caller.
pub trait MetricsSink: Send + Sync {
    fn action(&self, action: MetricsAction, subtype: i32);
}

/// Writes metrics to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn action(&self, action: MetricsAction, subtype: i32) {
        info!("[Metrics] {} subtype={}", action, subtype);
    }
}
