use crate::models::{ScanResult, Severity};
use crate::session::SessionView;

pub fn format_result_markdown(result: &ScanResult) -> String {
    let severity = result.severity.map(|s| s.as_str()).unwrap_or("n/a");
    let mut out = format!(
        "### {}\n\n**Status:** {}\n**Severity:** {}\n**Finished:** {}\n",
        result.tool_name,
        result.status,
        severity,
        result.timestamp.to_rfc3339(),
    );
    if let Some(metrics) = &result.metrics {
        out.push_str(&format!(
            "\n| Attack success | Detection time | Data exfil | Repeat failures |\n|---|---|---|---|\n| {:.1}% | {:.2}s | {:.2} MB | {} |\n",
            metrics.attack_success_rate,
            metrics.detection_time,
            metrics.data_exfil_volume,
            metrics.repeat_failures,
        ));
    }
    if let Some(evidence) = result.evidence.as_ref().filter(|e| !e.trim().is_empty()) {
        out.push_str(&format!("\n**Evidence:**\n```\n{}\n```\n", evidence));
    }
    out
}

pub fn format_executive_summary(view: &SessionView) -> String {
    let count = |severity: Severity| {
        view.aggregated
            .severity_distribution
            .iter()
            .find(|c| c.severity == severity)
            .map(|c| c.count)
            .unwrap_or(0)
    };

    format!(
        "## Executive Summary\n\n| Severity | Count |\n|---|---|\n| Critical | {} |\n| High | {} |\n| Medium | {} |\n| Low | {} |\n| Info | {} |\n| **Total** | **{}** |\n\nAverage attack success: {:.1}% | Average detection time: {:.2}s | Data exfiltrated: {:.2} MB\n",
        count(Severity::Critical),
        count(Severity::High),
        count(Severity::Medium),
        count(Severity::Low),
        count(Severity::Info),
        view.aggregated.total_scans,
        view.aggregated.average_success_rate,
        view.aggregated.average_detection_time,
        view.aggregated.total_data_exfil,
    )
}

/// Full markdown report for a finished (or abandoned) session.
pub fn format_session_report(view: &SessionView) -> String {
    let mut report = format!(
        "# Scan Report {}\n\n- Project: {}\n- Phase: {}\n- Progress: {:.0}%\n",
        view.scan_id, view.project_id, view.phase, view.progress_percent,
    );
    if let Some(notice) = &view.notice {
        report.push_str(&format!("- Notice: {}\n", notice));
    }
    report.push('\n');
    report.push_str(&format_executive_summary(view));
    report.push_str("\n---\n\n");
    for result in &view.results {
        report.push_str(&format_result_markdown(result));
        report.push_str("\n---\n\n");
    }
    report
}
