use serde::Deserialize;
use serde_json::Value;

use crate::events::StreamEvent;
use crate::models::ScanResult;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireFrame {
    Log { message: String },
    Complete { result: ScanResult },
    Error {
        #[serde(default)]
        message: String,
    },
}

/// Outcome of decoding one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameDecode {
    Event(StreamEvent),
    /// Valid JSON with a `type` this client does not handle.
    Ignored { kind: String },
    /// Not JSON, no `type`, or a known `type` with a bad payload.
    Malformed(String),
}

pub fn decode_frame(raw: &str) -> FrameDecode {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return FrameDecode::Malformed(format!("not JSON: {}", e)),
    };

    let kind = match value.get("type").and_then(Value::as_str) {
        Some(k) => k.to_string(),
        None => return FrameDecode::Malformed("missing frame type".into()),
    };
    if !matches!(kind.as_str(), "log" | "complete" | "error") {
        return FrameDecode::Ignored { kind };
    }

    match serde_json::from_value::<WireFrame>(value) {
        Ok(WireFrame::Log { message }) => FrameDecode::Event(StreamEvent::Log(message)),
        Ok(WireFrame::Complete { result }) => FrameDecode::Event(StreamEvent::ResultUpdate(result)),
        Ok(WireFrame::Error { message }) => {
            let message = if message.is_empty() { "stream reported an error".to_string() } else { message };
            FrameDecode::Event(StreamEvent::Error(message))
        }
        Err(e) => FrameDecode::Malformed(format!("invalid '{}' frame: {}", kind, e)),
    }
}
