//! Human-readable sink for standard output.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::attrs::{AttrValue, Attributes};
use crate::error::LogResult;
use crate::sink::{lock, timestamp, Sink};
use crate::severity::Severity;

enum Target {
    /// The process's standard output; shared, not owned.
    Stdout,
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// Sink rendering each record as one `key=value` line.
///
/// Layout: `time=<rfc3339> level=<LEVEL> msg=<message> k=v ...`
pub struct ConsoleSink {
    target: Target,
}

impl ConsoleSink {
    /// Console sink writing to standard output.
    pub fn stdout() -> Self {
        Self {
            target: Target::Stdout,
        }
    }

    /// Console sink writing to an arbitrary stream, e.g. a buffer in tests.
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            target: Target::Writer(Mutex::new(Box::new(writer))),
        }
    }

    /// Render one record as a line, without the trailing newline.
    pub fn render(time: &str, severity: Severity, message: &str, attrs: &Attributes) -> String {
        let mut line = format!(
            "time={} level={} msg={}",
            time,
            severity,
            AttrValue::Str(message.to_string()).to_text()
        );
        if !attrs.is_empty() {
            line.push(' ');
            line.push_str(&attrs.to_text());
        }
        line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn emit(&self, severity: Severity, message: &str, attrs: &Attributes) -> LogResult<()> {
        let mut line = Self::render(&timestamp(), severity, message, attrs);
        line.push('\n');

        match &self.target {
            Target::Stdout => {
                // The stdout lock keeps concurrent lines whole.
                let mut out = io::stdout().lock();
                out.write_all(line.as_bytes())?;
                out.flush()?;
            }
            Target::Writer(writer) => {
                let mut writer = lock(writer);
                writer.write_all(line.as_bytes())?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}
