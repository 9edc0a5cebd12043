use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::models::{Project, StartScanRequest, StartScanResponse};
use crate::errors::{with_retry, RetryConfig, ScanwatchError};
use crate::models::{ScanResult, ToolName};

/// Request/response client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ScanwatchError> {
        let url = format!("{}/api/projects/{}", self.base_url, project_id);
        let resp = self.client.get(&url).send().await?;
        decode(resp, &format!("project {}", project_id)).await
    }

    /// Ask the backend to launch `tools` against a project. Returns the new scan id.
    pub async fn start_scan(&self, project_id: &str, tools: &[ToolName]) -> Result<StartScanResponse, ScanwatchError> {
        let body = StartScanRequest {
            project_id: project_id.to_string(),
            tools: tools.to_vec(),
        };
        let url = format!("{}/api/scans/start", self.base_url);

        let started: StartScanResponse = with_retry("start_scan", &self.retry, || async {
            let resp = self.client.post(&url).json(&body).send().await?;
            decode(resp, &format!("project {}", project_id)).await
        })
        .await?;

        info!(project_id = %project_id, scan_id = %started.scan_id, "Scan started");
        Ok(started)
    }

    /// All results the backend holds for a project, across every scan of it.
    pub async fn project_results(&self, project_id: &str) -> Result<Vec<ScanResult>, ScanwatchError> {
        let url = format!("{}/api/scans/{}/results", self.base_url, project_id);
        let resp = self.client.get(&url).send().await?;
        let results: Vec<ScanResult> = decode(resp, &format!("results for project {}", project_id)).await?;
        debug!(project_id = %project_id, count = results.len(), "Fetched project results");
        Ok(results)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, ScanwatchError> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ScanwatchError::NotFound(what.to_string()));
    }
    if status.is_client_error() {
        let detail = resp.text().await.unwrap_or_default();
        return Err(ScanwatchError::InvalidRequest(format!("{} ({}): {}", what, status, detail)));
    }
    if !status.is_success() {
        return Err(ScanwatchError::Network(format!("{} returned HTTP {}", what, status)));
    }
    resp.json::<T>()
        .await
        .map_err(|e| ScanwatchError::Protocol(format!("Invalid response for {}: {}", what, e)))
}
