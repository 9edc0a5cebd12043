use serde::{Deserialize, Serialize};

use crate::models::{ScanResult, Severity, ToolName};

/// Summary statistics derived from a results snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedView {
    pub total_scans: usize,
    pub critical_findings: usize,
    pub average_success_rate: f64,
    pub average_detection_time: f64,
    pub total_data_exfil: f64,
    /// One entry per result, in snapshot order.
    pub tool_performance: Vec<ToolPerformance>,
    /// Only severities that occur, most severe first.
    pub severity_distribution: Vec<SeverityCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPerformance {
    pub tool: ToolName,
    pub success_rate: f64,
    pub detection_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: usize,
}

/// Recompute the aggregated view from scratch.
///
/// Averages only consider results carrying metrics; sums and per-tool values
/// read missing metrics as zero.
pub fn recompute(snapshot: &[ScanResult]) -> AggregatedView {
    let with_metrics: Vec<_> = snapshot.iter().filter_map(|r| r.metrics.as_ref()).collect();

    let average_success_rate = mean(with_metrics.iter().map(|m| m.attack_success_rate));
    let average_detection_time = mean(with_metrics.iter().map(|m| m.detection_time));
    let total_data_exfil: f64 = with_metrics.iter().map(|m| m.data_exfil_volume).sum();

    let tool_performance = snapshot
        .iter()
        .map(|r| ToolPerformance {
            tool: r.tool_name,
            success_rate: r.metrics.map(|m| m.attack_success_rate).unwrap_or(0.0),
            detection_time: r.metrics.map(|m| m.detection_time).unwrap_or(0.0),
        })
        .collect();

    let severity_distribution = Severity::ALL
        .into_iter()
        .filter_map(|severity| {
            let count = snapshot.iter().filter(|r| r.severity == Some(severity)).count();
            (count > 0).then_some(SeverityCount { severity, count })
        })
        .collect();

    AggregatedView {
        total_scans: snapshot.len(),
        critical_findings: snapshot
            .iter()
            .filter(|r| r.severity == Some(Severity::Critical))
            .count(),
        average_success_rate,
        average_detection_time,
        total_data_exfil,
        tool_performance,
        severity_distribution,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
