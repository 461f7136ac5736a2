//! Diagnostic output for the logging facility itself.
//!
//! Sink failures and logger construction are reported through `tracing`;
//! this installs the subscriber that renders them. Diagnostics go to standard
//! error so they never interleave with console sink lines on standard output.

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither an override nor `RUST_LOG` is given.
const DEFAULT_FILTER: &str = "warn";

/// Initialize JSON diagnostics with environment-based filtering.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "info", "jig_log=debug")
pub fn init_logging(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = if let Some(level) = log_level {
        EnvFilter::try_new(level).with_context(|| format!("Invalid log filter: {}", level))?
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init()
        .context("Diagnostics subscriber already installed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_filter() {
        assert!(init_logging(Some("jig_log=notalevel")).is_err());
    }

    #[test]
    fn test_second_init_is_an_error() {
        let _ = init_logging(Some("debug"));
        assert!(init_logging(Some("debug")).is_err());
    }
}
