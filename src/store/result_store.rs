use std::collections::HashMap;

use tracing::debug;

use crate::models::ScanResult;

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First time this id was seen; appended at the end.
    Inserted { metrics_arrived: bool },
    /// Existing entry replaced.
    Replaced { metrics_arrived: bool },
    /// Incoming result would have moved a settled entry back to running.
    StaleIgnored,
    /// Incoming result was identical to the stored one.
    Unchanged,
}

impl UpsertOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Inserted { .. } | Self::Replaced { .. })
    }

    /// True when the result carries metrics for the first time.
    pub fn metrics_arrived(&self) -> bool {
        match self {
            Self::Inserted { metrics_arrived } | Self::Replaced { metrics_arrived } => *metrics_arrived,
            _ => false,
        }
    }
}

/// In-memory source of truth for the results of one session.
///
/// Entries keep first-seen order. Settled entries never regress to running and
/// per-result log sequences only grow.
#[derive(Debug, Default)]
pub struct ResultStore {
    expected: usize,
    results: Vec<ScanResult>,
    pending_logs: HashMap<String, Vec<String>>,
}

impl ResultStore {
    pub fn new(expected_tools: usize) -> Self {
        Self {
            expected: expected_tools,
            results: Vec::new(),
            pending_logs: HashMap::new(),
        }
    }

    pub fn upsert(&mut self, mut incoming: ScanResult) -> UpsertOutcome {
        let Some(index) = self.results.iter().position(|r| r.id == incoming.id) else {
            if let Some(buffered) = self.pending_logs.remove(&incoming.id) {
                let mut logs = buffered;
                merge_logs(&mut logs, &incoming.logs);
                incoming.logs = logs;
            }
            let metrics_arrived = incoming.metrics.is_some();
            debug!(result_id = %incoming.id, status = ?incoming.status, "Result inserted");
            self.results.push(incoming);
            return UpsertOutcome::Inserted { metrics_arrived };
        };

        let stored = &mut self.results[index];
        if stored.is_settled() && !incoming.is_settled() {
            debug!(result_id = %incoming.id, "Ignoring running update for settled result");
            return UpsertOutcome::StaleIgnored;
        }

        let mut logs = stored.logs.clone();
        merge_logs(&mut logs, &incoming.logs);
        incoming.logs = logs;

        // Settled severity and metrics are never retracted by a later partial payload.
        if stored.is_settled() {
            incoming.severity = incoming.severity.or(stored.severity);
            incoming.metrics = incoming.metrics.or(stored.metrics);
        }

        let metrics_arrived = stored.metrics.is_none() && incoming.metrics.is_some();
        if *stored == incoming {
            return UpsertOutcome::Unchanged;
        }
        *stored = incoming;
        UpsertOutcome::Replaced { metrics_arrived }
    }

    /// Append a log line to a result, buffering it if the result is not held yet.
    pub fn append_log(&mut self, result_id: &str, line: impl Into<String>) {
        let line = line.into();
        match self.results.iter_mut().find(|r| r.id == result_id) {
            Some(result) => result.logs.push(line),
            None => self.pending_logs.entry(result_id.to_string()).or_default().push(line),
        }
    }

    /// Snapshot of all held results in first-seen order.
    pub fn all(&self) -> Vec<ScanResult> {
        self.results.clone()
    }

    pub fn as_slice(&self) -> &[ScanResult] {
        &self.results
    }

    pub fn get(&self, result_id: &str) -> Option<&ScanResult> {
        self.results.iter().find(|r| r.id == result_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn settled_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_settled()).count()
    }

    pub fn is_session_complete(&self) -> bool {
        self.results.len() == self.expected && self.results.iter().all(|r| r.is_settled())
    }
}

/// Merge `incoming` into `existing` without removing or reordering existing lines.
///
/// Lines of `incoming` already present in order are skipped; the rest are appended.
fn merge_logs(existing: &mut Vec<String>, incoming: &[String]) {
    if incoming.starts_with(existing) {
        existing.extend_from_slice(&incoming[existing.len()..]);
        return;
    }
    let mut cursor = 0;
    let mut missing = Vec::new();
    for line in incoming {
        match existing[cursor..].iter().position(|l| l == line) {
            Some(offset) => cursor += offset + 1,
            None => missing.push(line.clone()),
        }
    }
    existing.extend(missing);
}
