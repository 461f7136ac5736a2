//! Leveled, multi-sink logging for Jig applications.
//!
//! A [`Logger`] filters each call against a fixed threshold and fans accepted
//! records out to its sinks in attachment order. Loggers are plain values:
//! build one with [`LoggerFactory`] (or [`LogConfig::build`]) and pass it to
//! whatever needs it.
//!
//! ```no_run
//! use jig_log::{attrs, Severity};
//!
//! let logger = jig_log::build(Severity::Info, &["console", "file:app.log"])?;
//! logger.info("server started", &attrs!["port" => 8080]);
//! logger.close()?;
//! # Ok::<(), jig_log::LogError>(())
//! ```

pub mod attrs;
pub mod config;
pub mod console;
pub mod error;
pub mod factory;
pub mod file;
pub mod logger;
pub mod severity;
pub mod sink;
pub mod webhook;

pub use attrs::{AttrValue, Attributes};
pub use config::LogConfig;
pub use console::ConsoleSink;
pub use error::{LogError, LogResult};
pub use factory::{build, LoggerFactory, SinkSpec};
pub use file::FileSink;
pub use logger::{DispatchReport, FailurePolicy, Logger, SinkFailure};
pub use severity::Severity;
pub use sink::{MemoryRecord, MemorySink, Sink};
pub use webhook::WebhookSink;
