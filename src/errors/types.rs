use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ScanwatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScanwatchError::Timeout(e.to_string())
        } else if e.is_decode() {
            ScanwatchError::Protocol(e.to_string())
        } else {
            ScanwatchError::Network(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ScanwatchError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ScanwatchError::Stream(e.to_string())
    }
}
