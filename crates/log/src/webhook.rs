//! Remote alerting sink posting Slack-style webhook messages.

use std::io;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::{json, Value};

use crate::attrs::Attributes;
use crate::error::{LogError, LogResult};
use crate::sink::Sink;
use crate::severity::Severity;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sink that POSTs `{"text": "..."}` to an incoming-webhook URL.
///
/// Delivery is synchronous and attempted once; a transport error or a non-2xx
/// response is reported as an I/O failure.
pub struct WebhookSink {
    url: Url,
    client: Client,
    min_severity: Severity,
}

impl WebhookSink {
    /// Create a webhook sink for `url`.
    ///
    /// # Returns
    /// `ResourceUnavailable` if the URL is not a valid http(s) URL or the
    /// HTTP client cannot be constructed
    pub fn new(url: &str) -> LogResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| LogError::ResourceUnavailable(format!("webhook url {}: {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LogError::ResourceUnavailable(format!(
                "webhook url {}: unsupported scheme",
                url
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LogError::ResourceUnavailable(format!("webhook client: {}", e)))?;

        Ok(Self {
            url,
            client,
            min_severity: Severity::Debug,
        })
    }

    /// Only forward records at or above `severity`, e.g. alert on errors only.
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request body for one record.
    pub fn payload(severity: Severity, message: &str, attrs: &Attributes) -> Value {
        let mut text = format!("[{}] {}", severity, message);
        if !attrs.is_empty() {
            text.push(' ');
            text.push_str(&attrs.to_text());
        }
        json!({ "text": text })
    }
}

impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn emit(&self, severity: Severity, message: &str, attrs: &Attributes) -> LogResult<()> {
        if severity < self.min_severity {
            return Ok(());
        }

        let response = self
            .client
            .post(self.url.clone())
            .json(&Self::payload(severity, message, attrs))
            .send()
            .map_err(io::Error::other)?;

        if !response.status().is_success() {
            return Err(LogError::Io(io::Error::other(format!(
                "webhook responded with status {}",
                response.status()
            ))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one HTTP request with `status`, sending the request body back over the channel.
    fn serve_once(status: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            tx.send(String::from_utf8(body).unwrap()).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            )
            .unwrap();
        });

        (format!("http://{}/hook", addr), rx)
    }

    #[test]
    fn test_payload_text() {
        let payload = WebhookSink::payload(
            Severity::Error,
            "payment failed",
            &crate::attrs!["order" => 42],
        );
        assert_eq!(payload, json!({ "text": "[ERROR] payment failed order=42" }));
    }

    #[test]
    fn test_rejects_invalid_urls() {
        assert!(matches!(
            WebhookSink::new("not a url"),
            Err(LogError::ResourceUnavailable(_))
        ));
        assert!(matches!(
            WebhookSink::new("ftp://example.com/hook"),
            Err(LogError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_posts_record() {
        let (url, rx) = serve_once("200 OK");
        let sink = WebhookSink::new(&url).unwrap();

        sink.emit(Severity::Warn, "queue backlog", &crate::attrs!["depth" => 900])
            .unwrap();

        let body: Value = serde_json::from_str(&rx.recv().unwrap()).unwrap();
        assert_eq!(body["text"], "[WARN] queue backlog depth=900");
    }

    #[test]
    fn test_error_status_is_io_failure() {
        let (url, _rx) = serve_once("500 Internal Server Error");
        let sink = WebhookSink::new(&url).unwrap();

        let err = sink.emit(Severity::Error, "boom", &Attributes::new()).unwrap_err();
        assert!(matches!(err, LogError::Io(_)));
    }

    #[test]
    fn test_below_min_severity_is_not_sent() {
        // Nothing listens here; a send attempt would fail.
        let sink = WebhookSink::new("http://127.0.0.1:9/hook")
            .unwrap()
            .with_min_severity(Severity::Error);
        assert!(sink.emit(Severity::Warn, "skipped", &Attributes::new()).is_ok());
    }
}
