use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ScanResult, ToolName};

/// One time-series point, taken when a result first reports metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub tool_name: ToolName,
    pub success_rate: f64,
    pub detection_time: f64,
    pub data_exfil: f64,
    pub failures: u32,
}

impl MetricSample {
    pub fn from_result(result: &ScanResult, at: DateTime<Utc>) -> Option<Self> {
        let metrics = result.metrics?;
        Some(Self {
            timestamp: at,
            tool_name: result.tool_name,
            success_rate: metrics.attack_success_rate,
            detection_time: metrics.detection_time,
            data_exfil: metrics.data_exfil_volume,
            failures: metrics.repeat_failures,
        })
    }
}

/// Append-only, time-ordered sample sequence.
#[derive(Debug, Clone, Default)]
pub struct SampleSeries {
    samples: Vec<MetricSample>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample for `result` if it carries metrics.
    ///
    /// Timestamps are clamped so the series never goes backwards.
    pub fn record(&mut self, result: &ScanResult, at: DateTime<Utc>) -> bool {
        let at = match self.samples.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };
        match MetricSample::from_result(result, at) {
            Some(sample) => {
                self.samples.push(sample);
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
