//! Resolve declarative sink specifications into a [`Logger`].
//!
//! A specification is a kind tag, optionally followed by `:` and an argument:
//! `console`, `file:app.log`, `webhook:https://hooks.example.com/T000/B000`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::console::ConsoleSink;
use crate::error::{LogError, LogResult};
use crate::file::FileSink;
use crate::logger::Logger;
use crate::severity::Severity;
use crate::sink::Sink;
use crate::webhook::WebhookSink;

/// Backing file used by a bare `file` specification.
pub const DEFAULT_LOG_FILE: &str = "app.log";

/// Constructor for one sink kind, given the specification's argument.
pub type SinkConstructor = dyn Fn(Option<&str>) -> LogResult<Arc<dyn Sink>> + Send + Sync;

/// A parsed sink specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSpec {
    pub kind: String,
    pub arg: Option<String>,
}

impl SinkSpec {
    /// Split `kind[:arg]`. The kind is trimmed and lower-cased; an empty
    /// argument counts as none.
    pub fn parse(spec: &str) -> Self {
        let (kind, arg) = match spec.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg.trim())),
            None => (spec, None),
        };
        Self {
            kind: kind.trim().to_ascii_lowercase(),
            arg: arg.filter(|a| !a.is_empty()).map(str::to_string),
        }
    }
}

impl fmt::Display for SinkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}:{}", self.kind, arg),
            None => f.write_str(&self.kind),
        }
    }
}

/// Registry of sink kinds used to build loggers.
pub struct LoggerFactory {
    constructors: HashMap<String, Box<SinkConstructor>>,
}

impl LoggerFactory {
    /// Factory with the built-in `console`, `file` and `webhook` kinds.
    pub fn new() -> Self {
        Self::empty()
            .register("console", |_| {
                let sink: Arc<dyn Sink> = Arc::new(ConsoleSink::stdout());
                Ok(sink)
            })
            .register("file", |arg| {
                let sink: Arc<dyn Sink> = Arc::new(FileSink::open(arg.unwrap_or(DEFAULT_LOG_FILE))?);
                Ok(sink)
            })
            .register("webhook", |arg| {
                let url = arg.ok_or_else(|| {
                    LogError::ResourceUnavailable("webhook sink requires a url".to_string())
                })?;
                let sink: Arc<dyn Sink> = Arc::new(WebhookSink::new(url)?);
                Ok(sink)
            })
    }

    /// Factory with no kinds registered.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(mut self, kind: &str, constructor: F) -> Self
    where
        F: Fn(Option<&str>) -> LogResult<Arc<dyn Sink>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(kind.to_ascii_lowercase(), Box::new(constructor));
        self
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build a logger with sinks in specification order.
    ///
    /// # Arguments
    /// * `threshold` - Minimum severity the logger dispatches
    /// * `specs` - Sink specifications, e.g. `["console", "file:app.log"]`
    ///
    /// # Returns
    /// The logger, or the first error. Every specification is checked against
    /// the registry before any resource is opened, and sinks opened before a
    /// failing one are released before the error is returned.
    pub fn build<S: AsRef<str>>(&self, threshold: Severity, specs: &[S]) -> LogResult<Logger> {
        let parsed: Vec<SinkSpec> = specs.iter().map(|s| SinkSpec::parse(s.as_ref())).collect();

        let mut resolved = Vec::with_capacity(parsed.len());
        for spec in &parsed {
            let constructor = self
                .constructors
                .get(&spec.kind)
                .ok_or_else(|| LogError::UnknownSinkKind(spec.kind.clone()))?;
            resolved.push((spec, constructor));
        }

        // On error the sinks collected so far are dropped, closing their resources.
        let sinks = resolved
            .into_iter()
            .map(|(spec, constructor)| {
                debug!("Constructing sink {}", spec);
                constructor(spec.arg.as_deref())
            })
            .collect::<LogResult<Vec<_>>>()?;

        info!(
            threshold = %threshold,
            sinks = %parsed.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            "Built logger"
        );
        Ok(Logger::new(threshold, sinks))
    }
}

impl Default for LoggerFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a logger using the built-in sink kinds.
pub fn build<S: AsRef<str>>(threshold: Severity, specs: &[S]) -> LogResult<Logger> {
    LoggerFactory::new().build(threshold, specs)
}
