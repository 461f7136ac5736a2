//! Diagnostics and delivery metrics for the Jig logging facility.

pub mod metrics;
pub mod logging;

pub use metrics::{MeteredSink, SinkMetrics};
pub use logging::init_logging;
