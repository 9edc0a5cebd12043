use std::path::Path;

use super::schema::CONFIG_SCHEMA;
use super::types::MonitorConfig;
use crate::errors::ScanwatchError;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<MonitorConfig, ScanwatchError> {
    if !path.exists() {
        return Err(ScanwatchError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(ScanwatchError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<MonitorConfig, ScanwatchError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    // An empty file parses to null; treat it as all defaults.
    if yaml.is_null() {
        return Ok(MonitorConfig::default());
    }

    validate_schema(&yaml)?;

    let config: MonitorConfig = serde_yaml::from_value(yaml)?;
    validate_semantics(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), ScanwatchError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| ScanwatchError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| ScanwatchError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; typed parsing and semantic checks decide.
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

/// Reject values that would stall or spin a session.
fn validate_semantics(config: &MonitorConfig) -> Result<(), ScanwatchError> {
    if let Some(url) = config.server.as_ref().and_then(|s| s.base_url.as_deref()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ScanwatchError::Config(format!(
                "server.base_url must use http or https: '{}'",
                url
            )));
        }
    }

    if let Some(stream) = &config.stream {
        if stream.reconnect_base_delay_ms == Some(0) {
            return Err(ScanwatchError::Config("stream.reconnect_base_delay_ms must be non-zero".into()));
        }
    }

    if let Some(poll) = &config.poll {
        if poll.interval_ms == Some(0) {
            return Err(ScanwatchError::Config("poll.interval_ms must be non-zero".into()));
        }
        if poll.max_interval_ms == Some(0) {
            return Err(ScanwatchError::Config("poll.max_interval_ms must be non-zero".into()));
        }
        let settings = config.to_settings();
        if settings.poll.max_interval < settings.poll.interval {
            return Err(ScanwatchError::Config(format!(
                "poll.max_interval_ms ({}) is below poll.interval_ms ({})",
                settings.poll.max_interval.as_millis(),
                settings.poll.interval.as_millis()
            )));
        }
        if poll.degraded_after == Some(0) {
            warn!("poll.degraded_after is 0; degraded polling will never be reported");
        }
    }

    if config.progress.as_ref().and_then(|p| p.expected_log_lines_per_tool) == Some(0) {
        return Err(ScanwatchError::Config("progress.expected_log_lines_per_tool must be non-zero".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_valid_config() {
        let config = parse_config_str(
            "server:\n  base_url: http://localhost:3001\npoll:\n  interval_ms: 1000\n  max_interval_ms: 8000\n",
        )
        .unwrap();
        let settings = config.to_settings();
        assert_eq!(settings.poll.interval, Duration::from_secs(1));
        assert_eq!(settings.poll.max_interval, Duration::from_secs(8));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config_str("").unwrap();
        assert!(config.server.is_none());
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let err = parse_config_str("server:\n  base_url: ftp://dash\n").unwrap_err();
        assert!(matches!(err, ScanwatchError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(parse_config_str("poll:\n  interval_ms: 0\n").is_err());
        assert!(parse_config_str("stream:\n  reconnect_base_delay_ms: 0\n").is_err());
        assert!(parse_config_str("progress:\n  expected_log_lines_per_tool: 0\n").is_err());
    }

    #[test]
    fn test_rejects_max_below_interval() {
        let err = parse_config_str("poll:\n  interval_ms: 5000\n  max_interval_ms: 1000\n").unwrap_err();
        assert!(err.to_string().contains("max_interval_ms"));
    }

    #[test]
    fn test_type_mismatch_is_yaml_error() {
        let err = parse_config_str("poll:\n  interval_ms: soon\n").unwrap_err();
        assert!(matches!(err, ScanwatchError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_parse_config_missing_file() {
        let err = parse_config(Path::new("/nonexistent/scanwatch.yaml")).await.unwrap_err();
        assert!(matches!(err, ScanwatchError::Config(_)));
    }

    #[tokio::test]
    async fn test_parse_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output:\n  directory: ./reports").unwrap();
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.output_directory(), Some("./reports"));
    }
}
