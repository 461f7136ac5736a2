//! JSON-lines sink backed by an append-only file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::attrs::Attributes;
use crate::error::{LogError, LogResult};
use crate::sink::{lock, timestamp, Sink};
use crate::severity::Severity;

/// Record fields written before any attribute.
const RESERVED_KEYS: [&str; 3] = ["time", "level", "msg"];

/// Prefix for attributes whose key collides with a record field.
const ATTR_PREFIX: &str = "attr.";

/// One file record: `{"time":..,"level":..,"msg":..,<attrs>}`.
///
/// Attributes are written as top-level fields in call order; duplicate keys
/// are written as they come. An attribute named `time`, `level` or `msg` is
/// written as `attr.<key>` so it cannot shadow the record's own field.
pub struct Record<'a> {
    pub time: &'a str,
    pub severity: Severity,
    pub message: &'a str,
    pub attrs: &'a Attributes,
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.attrs.len()))?;
        map.serialize_entry("time", self.time)?;
        map.serialize_entry("level", &self.severity)?;
        map.serialize_entry("msg", self.message)?;
        for (key, value) in self.attrs.iter() {
            if RESERVED_KEYS.contains(&key) {
                map.serialize_entry(&format!("{}{}", ATTR_PREFIX, key), value)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Sink appending one JSON record per line to a file it exclusively owns.
///
/// The handle is acquired in [`FileSink::open`] and released exactly once,
/// either by [`Sink::close`] or when the sink is dropped.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileSink {
    /// Open `path` in append-create mode.
    ///
    /// # Arguments
    /// * `path` - Backing file; created if missing, never truncated
    ///
    /// # Returns
    /// The sink, or `ResourceUnavailable` if the file cannot be opened for append
    pub fn open<P: AsRef<Path>>(path: P) -> LogResult<Self> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let file = options
            .open(&path)
            .map_err(|e| LogError::ResourceUnavailable(format!("{}: {}", path.display(), e)))?;

        debug!("Opened file sink at {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the sink still holds its file handle.
    pub fn is_open(&self) -> bool {
        lock(&self.file).is_some()
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn emit(&self, severity: Severity, message: &str, attrs: &Attributes) -> LogResult<()> {
        let time = timestamp();
        let mut line = serde_json::to_vec(&Record {
            time: &time,
            severity,
            message,
            attrs,
        })?;
        line.push(b'\n');

        let mut guard = lock(&self.file);
        let file = guard.as_mut().ok_or_else(|| {
            LogError::ResourceUnavailable(format!("{}: sink is closed", self.path.display()))
        })?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }

    fn close(&self) -> LogResult<()> {
        if let Some(mut file) = lock(&self.file).take() {
            file.flush()?;
            file.sync_all()?;
            debug!("Closed file sink at {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_record_is_one_json_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::open(&path).unwrap();

        sink.emit(
            Severity::Info,
            "hello",
            &crate::attrs!["k" => "v", "n" => 3, "ok" => true],
        )
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(contents.trim_end()).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["msg"], "hello");
        assert_eq!(value["k"], "v");
        assert_eq!(value["n"], 3);
        assert_eq!(value["ok"], true);
        assert!(value["time"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_field_order_follows_attrs() {
        let attrs = crate::attrs!["z" => 1, "a" => 2];
        let record = Record {
            time: "t",
            severity: Severity::Error,
            message: "m",
            attrs: &attrs,
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"time":"t","level":"ERROR","msg":"m","z":1,"a":2}"#
        );
    }

    #[test]
    fn test_reserved_attr_keys_do_not_shadow_record_fields() {
        let attrs = crate::attrs!["level" => "DEBUG", "msg" => "forged", "time" => 0, "user" => "ada"];
        let record = Record {
            time: "t",
            severity: Severity::Error,
            message: "real",
            attrs: &attrs,
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["msg"], "real");
        assert_eq!(value["time"], "t");
        assert_eq!(value["attr.level"], "DEBUG");
        assert_eq!(value["attr.msg"], "forged");
        assert_eq!(value["attr.time"], 0);
        assert_eq!(value["user"], "ada");
    }

    #[test]
    fn test_close_syncs_after_emits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::open(&path).unwrap();

        for i in 0..3 {
            sink.emit(Severity::Info, "before close", &crate::attrs!["i" => i]).unwrap();
        }
        sink.close().unwrap();
        assert!(!sink.is_open());

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_appends_after_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "previous\n").unwrap();

        let sink = FileSink::open(&path).unwrap();
        sink.emit(Severity::Warn, "next", &Attributes::new()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "previous");
        assert!(lines[1].contains("\"msg\":\"next\""));
    }

    #[test]
    fn test_open_missing_directory_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");
        let err = FileSink::open(&path).unwrap_err();
        assert!(matches!(err, LogError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_close_releases_once_and_rejects_later_emits() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::open(dir.path().join("app.log")).unwrap();
        assert!(sink.is_open());

        sink.close().unwrap();
        assert!(!sink.is_open());
        sink.close().unwrap();

        let err = sink.emit(Severity::Info, "late", &Attributes::new()).unwrap_err();
        assert!(matches!(err, LogError::ResourceUnavailable(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_is_io() {
        let sink = FileSink::open("/dev/full").unwrap();
        let err = sink.emit(Severity::Error, "no space", &Attributes::new()).unwrap_err();
        assert!(matches!(err, LogError::Io(_)));
    }

    #[test]
    fn test_concurrent_emits_keep_records_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = Arc::new(FileSink::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..50 {
                        let attrs = crate::attrs!["thread" => t, "i" => i, "pad" => "x".repeat(200)];
                        sink.emit(Severity::Info, "concurrent", &attrs).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 400);
        for line in contents.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["msg"], "concurrent");
        }
    }
}
