use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{PollBackoff, ReconnectPolicy};
use crate::session::SessionSettings;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
pub const SERVER_ENV_VAR: &str = "SCANWATCH_SERVER";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MonitorConfig {
    pub server: Option<ServerConfig>,
    pub stream: Option<StreamConfig>,
    pub poll: Option<PollConfig>,
    pub progress: Option<ProgressConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StreamConfig {
    pub max_reconnect_attempts: Option<u32>,
    pub reconnect_base_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PollConfig {
    pub interval_ms: Option<u64>,
    pub max_interval_ms: Option<u64>,
    pub degraded_after: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProgressConfig {
    pub expected_log_lines_per_tool: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    pub directory: Option<String>,
}

impl MonitorConfig {
    /// Resolve the dashboard base URL: explicit flag, then environment, then file, then default.
    pub fn server_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| std::env::var(SERVER_ENV_VAR).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.server.as_ref().and_then(|s| s.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_SERVER.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn output_directory(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.directory.as_deref())
    }

    /// Session tunables with file values layered over the defaults.
    pub fn to_settings(&self) -> SessionSettings {
        let defaults = SessionSettings::default();

        let reconnect = match &self.stream {
            Some(stream) => ReconnectPolicy {
                max_attempts: stream.max_reconnect_attempts.unwrap_or(defaults.reconnect.max_attempts),
                base_delay: stream
                    .reconnect_base_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.reconnect.base_delay),
            },
            None => defaults.reconnect,
        };

        let poll = match &self.poll {
            Some(poll) => PollBackoff {
                interval: poll.interval_ms.map(Duration::from_millis).unwrap_or(defaults.poll.interval),
                max_interval: poll
                    .max_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.poll.max_interval),
                degraded_after: poll.degraded_after.unwrap_or(defaults.poll.degraded_after),
            },
            None => defaults.poll,
        };

        let expected_log_lines_per_tool = self
            .progress
            .as_ref()
            .and_then(|p| p.expected_log_lines_per_tool)
            .unwrap_or(defaults.expected_log_lines_per_tool);

        SessionSettings {
            reconnect,
            poll,
            expected_log_lines_per_tool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert!(config.server.is_none());
        assert!(config.poll.is_none());
        assert_eq!(config.to_settings(), SessionSettings::default());
    }

    #[test]
    fn test_partial_sections_layer_over_defaults() {
        let config = MonitorConfig {
            poll: Some(PollConfig {
                interval_ms: Some(500),
                ..Default::default()
            }),
            stream: Some(StreamConfig {
                max_reconnect_attempts: Some(2),
                reconnect_base_delay_ms: None,
            }),
            ..Default::default()
        };
        let settings = config.to_settings();
        assert_eq!(settings.poll.interval, Duration::from_millis(500));
        assert_eq!(settings.poll.max_interval, Duration::from_secs(30));
        assert_eq!(settings.reconnect.max_attempts, 2);
        assert_eq!(settings.reconnect.base_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_server_url_flag_wins_and_trims_slash() {
        let config = MonitorConfig {
            server: Some(ServerConfig { base_url: Some("http://file:1".into()) }),
            ..Default::default()
        };
        assert_eq!(config.server_url(Some("http://flag:2/")), "http://flag:2");
    }

    #[test]
    fn test_yaml_deserialize() {
        let yaml = "server:\n  base_url: https://dash.example\nprogress:\n  expected_log_lines_per_tool: 20\n";
        let config: MonitorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.unwrap().base_url.as_deref(), Some("https://dash.example"));
        assert_eq!(config.progress.unwrap().expected_log_lines_per_tool, Some(20));
    }
}
