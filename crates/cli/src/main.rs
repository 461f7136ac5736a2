//! Command-line front end for Jig applications.

use anyhow::Context;
use clap::{Parser, Subcommand};
use jig_log::{AttrValue, Attributes, FailurePolicy, LogConfig, Severity};
use jig_telemetry::init_logging;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "jig")]
#[command(about = "Scaffold Jig applications and emit messages through their log sinks")]
struct Cli {
    /// Filter for the tool's own diagnostics on stderr (e.g. "info", "jig_log=debug")
    #[arg(long, global = true, env = "JIG_DIAGNOSTICS")]
    diagnostics: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project folders and .env file under a root path
    New {
        /// Application root
        root: PathBuf,
    },
    /// Emit one message through the configured sinks
    Log {
        /// Debug mode: lowers the threshold to DEBUG unless --level is given
        #[arg(long, env = "JIG_DEBUG")]
        debug: bool,

        /// Minimum severity dispatched to sinks
        #[arg(long, env = "JIG_LOG_LEVEL")]
        level: Option<Severity>,

        /// Sink specification, repeatable (console, file:<path>, webhook:<url>)
        #[arg(long = "sink", env = "JIG_LOG_SINKS", value_delimiter = ',')]
        sinks: Vec<String>,

        /// Severity of the message
        #[arg(long, short, default_value = "info")]
        severity: Severity,

        /// Structured attribute as key=value, repeatable
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, AttrValue)>,

        /// Drop individual sink errors instead of reporting them
        #[arg(long)]
        ignore_failures: bool,

        /// Message text
        message: String,
    },
}

struct LogArgs {
    debug: bool,
    level: Option<Severity>,
    sinks: Vec<String>,
    severity: Severity,
    attrs: Vec<(String, AttrValue)>,
    ignore_failures: bool,
    message: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.diagnostics.as_deref())?;

    match cli.command {
        Commands::New { root } => {
            jig_scaffold::init_project(&root)?;
            info!("Initialized project at {}", root.display());
        }
        Commands::Log {
            debug,
            level,
            sinks,
            severity,
            attrs,
            ignore_failures,
            message,
        } => {
            run_log(LogArgs {
                debug,
                level,
                sinks,
                severity,
                attrs,
                ignore_failures,
                message,
            })?;
        }
    }

    Ok(())
}

fn run_log(args: LogArgs) -> anyhow::Result<()> {
    let config = log_config(&args);
    let logger = config.build().context("Failed to build logger")?;

    let attrs: Attributes = args.attrs.into_iter().collect();
    let report = logger.log(args.severity, &args.message, &attrs);

    if report.is_filtered() {
        debug!(
            "Message at {} below threshold {}",
            args.severity,
            logger.threshold()
        );
    } else if !report.is_ok() {
        warn!("{}", report);
    }

    let all_failed = report.all_failed();
    logger.close().context("Failed to close log sinks")?;

    if all_failed {
        anyhow::bail!("No sink accepted the message");
    }
    Ok(())
}

fn log_config(args: &LogArgs) -> LogConfig {
    let mut config = LogConfig {
        debug: args.debug,
        level: args.level,
        failure_policy: if args.ignore_failures {
            FailurePolicy::Ignore
        } else {
            FailurePolicy::Report
        },
        ..LogConfig::default()
    };
    if !args.sinks.is_empty() {
        config.sinks = args.sinks.clone();
    }
    config
}

/// Parse `key=value`, typing the value as bool, integer, float or string.
fn parse_attr(raw: &str) -> Result<(String, AttrValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty attribute key in '{}'", raw));
    }

    let value = if let Ok(b) = value.parse::<bool>() {
        AttrValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        AttrValue::Int(i)
    } else if let Some(f) = value.parse::<f64>().ok().filter(|f| f.is_finite()) {
        AttrValue::Float(f)
    } else {
        AttrValue::Str(value.to_string())
    };

    Ok((key.to_string(), value))
}
