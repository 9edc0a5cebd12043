use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::errors::ScanwatchError;

/// Raw text frames from one live connection. The stream ends when the connection closes.
pub type FrameStream = BoxStream<'static, Result<String, ScanwatchError>>;

/// Opens a live telemetry connection for a stream id.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, stream_id: &str) -> Result<FrameStream, ScanwatchError>;
}

/// WebSocket connector for `/api/scans/{scan_id}/stream`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    ws_base: String,
}

impl WsConnector {
    /// Build from the dashboard's HTTP base URL (`http` → `ws`, `https` → `wss`).
    pub fn from_http_base(base_url: &str) -> Result<Self, ScanwatchError> {
        let trimmed = base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = trimmed.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
            trimmed.to_string()
        } else {
            return Err(ScanwatchError::Config(format!("Unsupported server URL scheme: {}", base_url)));
        };
        Ok(Self { ws_base })
    }

    pub fn stream_url(&self, stream_id: &str) -> String {
        format!("{}/api/scans/{}/stream", self.ws_base, stream_id)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, stream_id: &str) -> Result<FrameStream, ScanwatchError> {
        let url = self.stream_url(stream_id);
        debug!(url = %url, "Opening WebSocket");
        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;

        let frames = socket
            .filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                    Ok(_) => None,
                    Err(e) => Some(Err(ScanwatchError::from(e))),
                }
            })
            .boxed();
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_url_from_http_base() {
        let connector = WsConnector::from_http_base("http://localhost:8000/").unwrap();
        assert_eq!(connector.stream_url("abc"), "ws://localhost:8000/api/scans/abc/stream");
    }

    #[test]
    fn test_stream_url_from_https_base() {
        let connector = WsConnector::from_http_base("https://dash.example.com").unwrap();
        assert_eq!(connector.stream_url("abc"), "wss://dash.example.com/api/scans/abc/stream");
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        assert!(WsConnector::from_http_base("ftp://host").is_err());
    }
}
