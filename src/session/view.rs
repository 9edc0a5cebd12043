use serde::{Deserialize, Serialize};

use super::state::SessionPhase;
use crate::metrics::{AggregatedView, MetricSample};
use crate::models::ScanResult;

/// Read-only projection of a session, re-published after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub project_id: String,
    pub scan_id: String,
    pub phase: SessionPhase,
    pub logs: Vec<String>,
    pub results: Vec<ScanResult>,
    pub aggregated: AggregatedView,
    pub samples: Vec<MetricSample>,
    pub progress_percent: f64,
    pub is_complete: bool,
    pub degraded: bool,
    pub notice: Option<String>,
    pub dropped_frames: u64,
}
