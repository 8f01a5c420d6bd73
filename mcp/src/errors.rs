use thiserror::Error;

/// Failures of the underlying message channel
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
