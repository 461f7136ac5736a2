//! Error taxonomy for the logging facility.

/// Error type for logger construction and sink delivery.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A sink specification named a kind no constructor is registered for.
    #[error("Unknown sink kind: {0}")]
    UnknownSinkKind(String),
    /// A sink's backing resource could not be acquired, or is no longer held.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),
    /// Writing to an already-acquired resource failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be rendered into the sink's wire format.
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),
}

/// Result type for logging operations.
pub type LogResult<T> = Result<T, LogError>;
