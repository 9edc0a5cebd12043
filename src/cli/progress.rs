use std::collections::HashMap;
use std::time::{Duration, Instant};

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::models::{ScanResult, ScanStatus, ToolName};
use crate::session::{SessionPhase, SessionView};

/// Renders published session views as indicatif progress bars.
pub struct ScanProgress {
    multi: MultiProgress,
    overall: ProgressBar,
    tool_bars: HashMap<ToolName, ProgressBar>,
    status_bar: ProgressBar,
    printed_logs: usize,
    last_notice: Option<String>,
    start_time: Instant,
}

impl ScanProgress {
    pub fn new(tools: &[ToolName]) -> Self {
        let multi = MultiProgress::new();

        let overall = multi.add(ProgressBar::new(100));
        overall.set_style(bar_style("  {bar:30.cyan/dark_gray} {pos:>3}% | {msg}"));
        overall.set_message("Connecting...");

        let mut tool_bars = HashMap::new();
        for tool in tools {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(spinner_style("    {spinner:.yellow} {msg}"));
            bar.set_message(format!("{} waiting", tool));
            bar.enable_steady_tick(Duration::from_millis(100));
            tool_bars.insert(*tool, bar);
        }

        // Status bar at the bottom showing elapsed / phase / findings
        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(spinner_style("  {spinner:.cyan} {msg}"));
        status_bar.set_message("Initializing session...");
        status_bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            multi,
            overall,
            tool_bars,
            status_bar,
            printed_logs: 0,
            last_notice: None,
            start_time: Instant::now(),
        }
    }

    /// Bring the bars in line with the latest view.
    pub fn update(&mut self, view: &SessionView) {
        for line in view.logs.iter().skip(self.printed_logs) {
            self.println(&format!("  {} {}", style("›").dim(), line));
        }
        self.printed_logs = self.printed_logs.max(view.logs.len());

        if view.notice != self.last_notice {
            if let Some(notice) = &view.notice {
                let marker = if view.degraded { style("⚠").red() } else { style("⚠").yellow() };
                self.println(&format!("  {} {}", marker, notice));
            }
            self.last_notice = view.notice.clone();
        }

        self.overall.set_position(view.progress_percent.round().clamp(0.0, 100.0) as u64);
        self.overall.set_message(phase_label(view.phase));

        for result in &view.results {
            if let Some(bar) = self.tool_bars.get(&result.tool_name) {
                bar.set_message(describe(result));
                if result.is_settled() && !bar.is_finished() {
                    bar.finish_with_message(describe(result));
                }
            }
        }

        if view.is_complete {
            self.finish(view);
        } else {
            self.status_bar.set_message(format!(
                "{} | {} | {}/{} settled | {} critical",
                format_elapsed(self.start_time.elapsed().as_millis() as u64),
                view.phase,
                view.results.iter().filter(|r| r.is_settled()).count(),
                self.tool_bars.len(),
                view.aggregated.critical_findings,
            ));
        }
    }

    /// Stop every bar; used on completion and on interrupt.
    pub fn finish(&mut self, view: &SessionView) {
        for bar in self.tool_bars.values() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
        let elapsed = format_elapsed(self.start_time.elapsed().as_millis() as u64);
        if view.is_complete {
            self.overall.finish_with_message("All tools settled");
            self.status_bar.finish_with_message(format!(
                "Scan complete: {} results | {} critical | avg success {:.1}% | {}",
                view.aggregated.total_scans,
                view.aggregated.critical_findings,
                view.aggregated.average_success_rate,
                elapsed,
            ));
        } else {
            self.overall.abandon_with_message("Stopped");
            self.status_bar.finish_with_message(format!("Session stopped after {}", elapsed));
        }
    }

    /// Print a line through the multi-progress (won't interfere with bars).
    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn phase_label(phase: SessionPhase) -> String {
    match phase {
        SessionPhase::Initializing => "Connecting...".to_string(),
        SessionPhase::Streaming => "Streaming live telemetry".to_string(),
        SessionPhase::Reconciling => "Catching up on missed results".to_string(),
        SessionPhase::Polling => "Polling for results".to_string(),
        SessionPhase::Completed => "Complete".to_string(),
    }
}

fn describe(result: &ScanResult) -> String {
    match result.status {
        ScanStatus::Running => format!("{} running", result.tool_name),
        ScanStatus::Completed => {
            let severity = result.severity.map(|s| s.as_str()).unwrap_or("no severity");
            let rate = result.metrics.map(|m| m.attack_success_rate).unwrap_or(0.0);
            format!("{} {} ({}, {:.1}% success)", style("✓").green(), result.tool_name, severity, rate)
        }
        ScanStatus::Failed => format!("{} {} failed", style("✗").red(), result.tool_name),
    }
}

pub fn format_elapsed(ms: u64) -> String {
    let secs = ms / 1000;
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    if mins > 0 {
        format!("{}m{}s", mins, remaining_secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(999), "0s");
        assert_eq!(format_elapsed(45_000), "45s");
        assert_eq!(format_elapsed(125_000), "2m5s");
    }

    #[test]
    fn test_phase_labels_are_distinct() {
        let labels: std::collections::HashSet<_> = [
            SessionPhase::Initializing,
            SessionPhase::Streaming,
            SessionPhase::Reconciling,
            SessionPhase::Polling,
            SessionPhase::Completed,
        ]
        .into_iter()
        .map(phase_label)
        .collect();
        assert_eq!(labels.len(), 5);
    }
}
