//! Already-parsed logger configuration.

use serde::{Deserialize, Serialize};

use crate::error::LogResult;
use crate::factory::{LoggerFactory, DEFAULT_LOG_FILE};
use crate::logger::{FailurePolicy, Logger};
use crate::severity::Severity;

/// Inputs for building the application logger.
///
/// The hosting application fills this from its own sources (flags,
/// environment, config file); nothing here reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Debug mode lowers the default threshold to `DEBUG`.
    pub debug: bool,
    /// Explicit threshold; overrides `debug` when set.
    pub level: Option<Severity>,
    /// Sink specifications in dispatch order.
    pub sinks: Vec<String>,
    pub failure_policy: FailurePolicy,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: None,
            sinks: vec!["console".to_string(), format!("file:{}", DEFAULT_LOG_FILE)],
            failure_policy: FailurePolicy::Report,
        }
    }
}

impl LogConfig {
    /// Effective threshold.
    pub fn threshold(&self) -> Severity {
        self.level
            .unwrap_or_else(|| Severity::from_debug_flag(self.debug))
    }

    /// Build a logger with the built-in sink kinds.
    pub fn build(&self) -> LogResult<Logger> {
        self.build_with(&LoggerFactory::new())
    }

    /// Build a logger with a custom factory.
    pub fn build_with(&self, factory: &LoggerFactory) -> LogResult<Logger> {
        Ok(factory
            .build(self.threshold(), self.sinks.as_slice())?
            .with_failure_policy(self.failure_policy))
    }
}
