use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fetcher::ResultsFetcher;
use crate::errors::PollBackoff;
use crate::events::{PollEvent, Tagged};
use crate::models::{ScanResult, ToolName};

/// The results one session waits on: its scan and its requested tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollScope {
    pub scan_id: String,
    pub tools: Vec<ToolName>,
}

impl PollScope {
    pub fn new(scan_id: impl Into<String>, tools: Vec<ToolName>) -> Self {
        Self { scan_id: scan_id.into(), tools }
    }

    /// True once every requested tool has a settled result of this scan in `snapshot`.
    ///
    /// Results of other scans or other tools never count toward completion.
    pub fn is_settled(&self, snapshot: &[ScanResult]) -> bool {
        self.tools.iter().all(|tool| {
            snapshot
                .iter()
                .any(|r| r.tool_name == *tool && r.belongs_to_scan(&self.scan_id) && r.is_settled())
        })
    }
}

/// Interval puller used when the live stream is unusable.
///
/// Fetches run one after another inside a single task, so a slow fetch delays
/// the next tick instead of overlapping it.
pub struct PollFallback;

impl PollFallback {
    /// Start polling. The first fetch happens after `first_delay`.
    ///
    /// Stops by itself after a snapshot in which `scope` is settled, or when
    /// the returned token is cancelled.
    pub fn start<F, T>(
        backoff: PollBackoff,
        fetcher: Arc<F>,
        scope: PollScope,
        first_delay: Duration,
        epoch: u64,
        subscriber: mpsc::UnboundedSender<T>,
    ) -> CancellationToken
    where
        F: ResultsFetcher + ?Sized,
        T: From<Tagged<PollEvent>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let emit = |event: PollEvent| subscriber.send(T::from(Tagged::new(epoch, event))).is_ok();
            let mut consecutive_failures: u32 = 0;
            let mut tick: u64 = 0;
            info!(
                epoch,
                interval_ms = backoff.interval.as_millis() as u64,
                first_delay_ms = first_delay.as_millis() as u64,
                "Poll fallback started"
            );

            if !first_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(first_delay) => {}
                }
            }

            loop {
                tick += 1;
                let fetched = tokio::select! {
                    _ = cancel.cancelled() => break,
                    fetched = fetcher.fetch() => fetched,
                };

                match fetched {
                    Ok(snapshot) => {
                        if consecutive_failures > 0 {
                            info!(tick, failures = consecutive_failures, "Poll fetch recovered");
                        }
                        consecutive_failures = 0;
                        let finished = scope.is_settled(&snapshot);
                        debug!(tick, count = snapshot.len(), finished, "Poll snapshot");
                        if !emit(PollEvent::Snapshot(snapshot)) {
                            break;
                        }
                        if finished {
                            info!(tick, "Every expected result settled; poll fallback finished");
                            emit(PollEvent::Finished);
                            break;
                        }
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        let degraded = backoff.is_degraded(consecutive_failures);
                        warn!(tick, failures = consecutive_failures, degraded, error = %e, "Poll fetch failed");
                        let sent = emit(PollEvent::FetchFailed {
                            consecutive_failures,
                            message: e.to_string(),
                            degraded,
                        });
                        if !sent {
                            break;
                        }
                    }
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff.delay_after(consecutive_failures)) => {}
                }
            }
            debug!(epoch, "Poll fallback task exited");
        });

        token
    }
}
