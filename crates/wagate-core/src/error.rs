use thiserror::Error;

/// Top-level error type for wagate.
#[derive(Debug, Error)]
pub enum GateError {
    /// Error from the messaging session (connect, upload, send).
    #[error("session error: {0}")]
    Session(String),

    /// Error fetching a remote attachment.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
