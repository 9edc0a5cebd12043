use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "server": {
                "type": "object",
                "properties": {
                    "base_url": { "type": "string", "format": "uri" }
                }
            },
            "stream": {
                "type": "object",
                "properties": {
                    "max_reconnect_attempts": { "type": "integer", "minimum": 0 },
                    "reconnect_base_delay_ms": { "type": "integer", "minimum": 1 }
                }
            },
            "poll": {
                "type": "object",
                "properties": {
                    "interval_ms": { "type": "integer", "minimum": 1 },
                    "max_interval_ms": { "type": "integer", "minimum": 1 },
                    "degraded_after": { "type": "integer", "minimum": 0 }
                }
            },
            "progress": {
                "type": "object",
                "properties": {
                    "expected_log_lines_per_tool": { "type": "integer", "minimum": 1 }
                }
            },
            "output": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string" }
                }
            }
        }
    })
});
