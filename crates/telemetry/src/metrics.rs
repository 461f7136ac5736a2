//! Prometheus counters for sink delivery.

use jig_log::{Attributes, LogResult, Severity, Sink};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::debug;

/// Delivery counters, labelled by sink name.
///
/// Each instance owns its registry, so several loggers (or tests) can keep
/// their own counters side by side.
#[derive(Clone)]
pub struct SinkMetrics {
    registry: Registry,
    records_emitted: IntCounterVec,
    sink_failures: IntCounterVec,
}

impl SinkMetrics {
    /// Create a new metrics instance with its own registry.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let records_emitted = IntCounterVec::new(
            Opts::new(
                "jig_log_records_emitted_total",
                "Total number of records a sink emitted successfully",
            ),
            &["sink"],
        )?;
        registry.register(Box::new(records_emitted.clone()))?;

        let sink_failures = IntCounterVec::new(
            Opts::new(
                "jig_log_sink_failures_total",
                "Total number of records a sink failed to emit",
            ),
            &["sink"],
        )?;
        registry.register(Box::new(sink_failures.clone()))?;

        Ok(Self {
            registry,
            records_emitted,
            sink_failures,
        })
    }

    /// Increment the emitted counter for `sink`.
    pub fn inc_emitted(&self, sink: &str) {
        self.records_emitted.with_label_values(&[sink]).inc();
    }

    /// Increment the failure counter for `sink`.
    pub fn inc_failures(&self, sink: &str) {
        self.sink_failures.with_label_values(&[sink]).inc();
    }

    pub fn emitted(&self, sink: &str) -> u64 {
        self.records_emitted.with_label_values(&[sink]).get()
    }

    pub fn failures(&self, sink: &str) -> u64 {
        self.sink_failures.with_label_values(&[sink]).get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get Prometheus metrics as a string.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Sink decorator counting the wrapped sink's outcomes.
pub struct MeteredSink<S> {
    inner: S,
    metrics: SinkMetrics,
}

impl<S: Sink> MeteredSink<S> {
    pub fn new(inner: S, metrics: SinkMetrics) -> Self {
        Self { inner, metrics }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Sink> Sink for MeteredSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn emit(&self, severity: Severity, message: &str, attrs: &Attributes) -> LogResult<()> {
        let result = self.inner.emit(severity, message, attrs);
        match &result {
            Ok(()) => self.metrics.inc_emitted(self.inner.name()),
            Err(e) => {
                debug!(sink = self.inner.name(), error = %e, "Counted sink failure");
                self.metrics.inc_failures(self.inner.name());
            }
        }
        result
    }

    fn close(&self) -> LogResult<()> {
        self.inner.close()
    }
}
