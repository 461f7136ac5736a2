//! The sink capability and an in-memory sink.
//!
//! A sink renders one log record in its own representation and hands it to
//! its output medium before `emit` returns. Sinks serialize their own writes:
//! the logger holds no lock, so each `emit` must be atomic with respect to
//! concurrent `emit` calls on the same sink.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{SecondsFormat, Utc};

use crate::attrs::Attributes;
use crate::error::LogResult;
use crate::severity::Severity;

/// Destination for accepted log records.
pub trait Sink: Send + Sync {
    /// Short identifier used in dispatch reports and metrics.
    fn name(&self) -> &str;

    /// Render and durably emit one record.
    fn emit(&self, severity: Severity, message: &str, attrs: &Attributes) -> LogResult<()>;

    /// Release any resource held by the sink.
    ///
    /// Called at most once by [`Logger::close`](crate::Logger::close). Sinks
    /// without a releasable resource keep the default.
    fn close(&self) -> LogResult<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn emit(&self, severity: Severity, message: &str, attrs: &Attributes) -> LogResult<()> {
        (**self).emit(severity, message, attrs)
    }

    fn close(&self) -> LogResult<()> {
        (**self).close()
    }
}

/// Current time as used in rendered records.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Lock a sink's mutex, recovering the guard if a previous writer panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A record captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub severity: Severity,
    pub message: String,
    pub attrs: Attributes,
}

/// Sink that keeps every record in memory.
///
/// Useful for tests and for hosts that want to inspect what was logged.
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    records: Mutex<Vec<MemoryRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the captured records, oldest first.
    pub fn records(&self) -> Vec<MemoryRecord> {
        lock(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, severity: Severity, message: &str, attrs: &Attributes) -> LogResult<()> {
        lock(&self.records).push(MemoryRecord {
            severity,
            message: message.to_string(),
            attrs: attrs.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.emit(Severity::Info, "first", &Attributes::new()).unwrap();
        sink.emit(Severity::Error, "second", &crate::attrs!["k" => "v"]).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].severity, Severity::Error);
        assert_eq!(records[1].attrs.to_text(), "k=v");

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_arc_sink_delegates() {
        let inner = Arc::new(MemorySink::named("shared"));
        let outer: Box<dyn Sink> = Box::new(inner.clone());
        assert_eq!(outer.name(), "shared");
        outer.emit(Severity::Warn, "via arc", &Attributes::new()).unwrap();
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
