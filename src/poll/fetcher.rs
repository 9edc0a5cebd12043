use async_trait::async_trait;

use crate::api::DashboardClient;
use crate::errors::ScanwatchError;
use crate::models::ScanResult;

/// Pulls the authoritative result list for one scan.
#[async_trait]
pub trait ResultsFetcher: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Vec<ScanResult>, ScanwatchError>;
}

/// Fetches `/api/scans/{project_id}/results` and keeps only the results of one scan.
#[derive(Debug, Clone)]
pub struct HttpResultsFetcher {
    client: DashboardClient,
    project_id: String,
    scan_id: String,
}

impl HttpResultsFetcher {
    pub fn new(client: DashboardClient, project_id: &str, scan_id: &str) -> Self {
        Self {
            client,
            project_id: project_id.to_string(),
            scan_id: scan_id.to_string(),
        }
    }
}

#[async_trait]
impl ResultsFetcher for HttpResultsFetcher {
    async fn fetch(&self) -> Result<Vec<ScanResult>, ScanwatchError> {
        let results = self.client.project_results(&self.project_id).await?;
        Ok(results
            .into_iter()
            .filter(|r| r.belongs_to_scan(&self.scan_id))
            .collect())
    }
}
