use std::path::PathBuf;

use tracing::debug;

use crate::config::{self, MonitorConfig};
use crate::errors::ScanwatchError;

/// Settings every subcommand resolves before doing work.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: MonitorConfig,
    pub server: String,
}

impl CliContext {
    pub async fn load(config_path: Option<&str>, server_flag: Option<&str>) -> Result<Self, ScanwatchError> {
        let config = match config_path {
            Some(path) => config::parse_config(&PathBuf::from(path)).await?,
            None => MonitorConfig::default(),
        };
        let server = config.server_url(server_flag);
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(ScanwatchError::Config(format!(
                "Dashboard URL must use http or https: '{}'",
                server
            )));
        }
        debug!(server = %server, config = ?config_path, "Resolved CLI context");
        Ok(Self { config, server })
    }
}
