use crate::errors::{PollBackoff, ReconnectPolicy};

/// Tunables for one monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub reconnect: ReconnectPolicy,
    pub poll: PollBackoff,
    /// Log lines a tool is expected to emit; sets the per-line progress step.
    pub expected_log_lines_per_tool: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            poll: PollBackoff::default(),
            expected_log_lines_per_tool: 10,
        }
    }
}

impl SessionSettings {
    /// Progress added by one log line.
    pub fn progress_step(&self, tool_count: usize) -> f64 {
        let lines = tool_count as f64 * self.expected_log_lines_per_tool.max(1) as f64;
        if lines == 0.0 {
            0.0
        } else {
            100.0 / lines
        }
    }
}
