//! Threshold filtering and fail-open fan-out to attached sinks.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::attrs::Attributes;
use crate::error::{LogError, LogResult};
use crate::sink::Sink;
use crate::severity::Severity;

/// What the logger keeps about a sink that failed during dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep each failure in the [`DispatchReport`] and emit a diagnostic event.
    #[default]
    Report,
    /// Count failures but drop their errors.
    Ignore,
}

/// A single sink's failure during one dispatch.
#[derive(Debug)]
pub struct SinkFailure {
    /// Position of the sink in attachment order.
    pub index: usize,
    pub sink: String,
    pub error: LogError,
}

/// Outcome of one per-level call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Whether the call passed the threshold.
    pub accepted: bool,
    /// Sinks invoked.
    pub attempted: usize,
    /// Sinks whose `emit` succeeded.
    pub delivered: usize,
    /// Failures kept under [`FailurePolicy::Report`].
    pub failures: Vec<SinkFailure>,
}

impl DispatchReport {
    fn filtered() -> Self {
        Self::default()
    }

    pub fn is_filtered(&self) -> bool {
        !self.accepted
    }

    /// Number of sinks that failed, regardless of policy.
    pub fn failed(&self) -> usize {
        self.attempted - self.delivered
    }

    pub fn is_ok(&self) -> bool {
        self.failed() == 0
    }

    /// Whether an accepted call reached no sink at all.
    pub fn all_failed(&self) -> bool {
        self.accepted && self.attempted > 0 && self.delivered == 0
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_filtered() {
            return f.write_str("filtered");
        }
        write!(f, "{} of {} sinks failed", self.failed(), self.attempted)?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.sink, failure.error)?;
        }
        Ok(())
    }
}

/// Leveled logger dispatching to an ordered list of sinks.
///
/// The threshold and sink list are fixed at construction. The logger holds no
/// lock of its own, so it can be shared across threads behind an `Arc` or a
/// plain reference.
pub struct Logger {
    threshold: Severity,
    sinks: Vec<Arc<dyn Sink>>,
    policy: FailurePolicy,
}

impl Logger {
    /// Create a logger from already-constructed sinks, kept in the given order.
    pub fn new(threshold: Severity, sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self {
            threshold,
            sinks,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }

    /// Whether a call at `severity` would be dispatched.
    ///
    /// Callers can check this before building expensive attributes.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    /// Filter, then hand the record to every sink in attachment order.
    ///
    /// A failing sink never prevents delivery to the sinks after it.
    pub fn log(&self, severity: Severity, message: &str, attrs: &Attributes) -> DispatchReport {
        if !self.enabled(severity) {
            return DispatchReport::filtered();
        }

        let mut report = DispatchReport {
            accepted: true,
            ..DispatchReport::default()
        };

        for (index, sink) in self.sinks.iter().enumerate() {
            report.attempted += 1;
            match sink.emit(severity, message, attrs) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    if self.policy == FailurePolicy::Report {
                        warn!(sink = sink.name(), index, error = %error, "Log sink failed");
                        report.failures.push(SinkFailure {
                            index,
                            sink: sink.name().to_string(),
                            error,
                        });
                    }
                }
            }
        }

        report
    }

    pub fn debug(&self, message: &str, attrs: &Attributes) -> DispatchReport {
        self.log(Severity::Debug, message, attrs)
    }

    pub fn info(&self, message: &str, attrs: &Attributes) -> DispatchReport {
        self.log(Severity::Info, message, attrs)
    }

    pub fn warn(&self, message: &str, attrs: &Attributes) -> DispatchReport {
        self.log(Severity::Warn, message, attrs)
    }

    pub fn error(&self, message: &str, attrs: &Attributes) -> DispatchReport {
        self.log(Severity::Error, message, attrs)
    }

    /// Release every sink's resource, in attachment order.
    ///
    /// All sinks are closed even if one fails; the first error is returned.
    pub fn close(self) -> LogResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.close() {
                warn!(sink = sink.name(), error = %e, "Failed to close log sink");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("Logger")
            .field("threshold", &self.threshold)
            .field("sinks", &names)
            .field("policy", &self.policy)
            .finish()
    }
}
