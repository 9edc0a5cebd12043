use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ToolName;

/// Kind of AI-facing target a project points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "Chat UI")]
    ChatUi,
    #[serde(rename = "RAG")]
    Rag,
    #[serde(rename = "Agent")]
    Agent,
    #[serde(rename = "File Upload")]
    FileUpload,
    #[serde(rename = "Log Data")]
    LogData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_url: String,
    pub target_type: TargetType,
    #[serde(deserialize_with = "crate::models::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScanRequest {
    pub project_id: String,
    pub tools: Vec<ToolName>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScanResponse {
    pub scan_id: String,
    pub status: String,
}
