use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::severity::Severity;
use super::tool::ToolName;

/// Execution state of one tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// A result is settled once it has left the running state.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ScanStatus::Running)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics a tool reports when its scan completes. Missing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanMetrics {
    pub attack_success_rate: f64,
    pub detection_time: f64,
    pub data_exfil_volume: f64,
    pub repeat_failures: u32,
}

/// One tool's execution against one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Producer-assigned identity, `{scan_id}_{tool}` for dashboard scans.
    pub id: String,
    pub project_id: String,
    pub tool_name: ToolName,
    pub status: ScanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(deserialize_with = "super::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ScanMetrics>,
}

impl ScanResult {
    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }

    /// Result id the dashboard backend assigns to `tool` within `scan_id`.
    pub fn result_id(scan_id: &str, tool: ToolName) -> String {
        format!("{}_{}", scan_id, tool.as_str())
    }

    /// Whether this result belongs to the given scan.
    pub fn belongs_to_scan(&self, scan_id: &str) -> bool {
        self.id
            .strip_prefix(scan_id)
            .is_some_and(|rest| rest.starts_with('_'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_payload() {
        let json = r#"{
            "id": "scan-1_PromptMap",
            "projectId": "proj-1",
            "toolName": "PromptMap",
            "status": "completed",
            "severity": "High",
            "evidence": "3 passed, 2 failed",
            "logs": ["a", "b"],
            "timestamp": "2024-05-01T10:00:00.000001",
            "metrics": {"attackSuccessRate": 40.0, "detectionTime": 2.5, "dataExfilVolume": 0.2, "repeatFailures": 2}
        }"#;
        let result: ScanResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.tool_name, ToolName::PromptMap);
        assert_eq!(result.status, ScanStatus::Completed);
        assert_eq!(result.severity, Some(Severity::High));
        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.attack_success_rate, 40.0);
        assert_eq!(metrics.repeat_failures, 2);
    }

    #[test]
    fn test_status_display_matches_wire_name() {
        for status in [ScanStatus::Running, ScanStatus::Completed, ScanStatus::Failed] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, status.as_str());
            assert_eq!(status.to_string(), status.as_str());
        }
        assert_eq!(ScanStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_running_result_without_optional_fields() {
        let json = r#"{"id":"s_RAG Tester","projectId":"p","toolName":"RAG Tester","status":"running","timestamp":"2024-05-01T10:00:00Z"}"#;
        let result: ScanResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_settled());
        assert!(result.logs.is_empty());
        assert!(result.severity.is_none());
        assert!(result.metrics.is_none());
    }

    #[test]
    fn test_empty_metrics_object_reads_as_zero() {
        let metrics: ScanMetrics = serde_json::from_str("{}").unwrap();
        assert_eq!(metrics, ScanMetrics::default());
    }

    #[test]
    fn test_scan_membership() {
        let json = r#"{"id":"scan-1_PromptMap","projectId":"p","toolName":"PromptMap","status":"running","timestamp":"2024-05-01T10:00:00Z"}"#;
        let result: ScanResult = serde_json::from_str(json).unwrap();
        assert!(result.belongs_to_scan("scan-1"));
        assert!(!result.belongs_to_scan("scan-10"));
        assert!(!result.belongs_to_scan("scan"));
        assert_eq!(ScanResult::result_id("scan-1", ToolName::PromptMap), result.id);
    }
}
