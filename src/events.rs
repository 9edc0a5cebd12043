use crate::models::ScanResult;

/// A message stamped with the session epoch that was current when its producer started.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub epoch: u64,
    pub event: T,
}

impl<T> Tagged<T> {
    pub fn new(epoch: u64, event: T) -> Self {
        Self { epoch, event }
    }
}

/// Events demultiplexed from the live telemetry stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A connection was established; `attempt` is 0 for the first connect.
    Connected { attempt: u32 },
    /// Free-form log line, usually prefixed with `[Tool Name]`.
    Log(String),
    /// A tool finished and the backend sent its full result.
    ResultUpdate(ScanResult),
    /// The backend reported an error, or reconnects were exhausted.
    Error(String),
}

/// Events produced by the poll fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Full result list for the scan as of this tick.
    Snapshot(Vec<ScanResult>),
    /// A fetch failed; polling continues on the next tick.
    FetchFailed {
        consecutive_failures: u32,
        message: String,
        degraded: bool,
    },
    /// Every expected result has settled; the poller has stopped.
    Finished,
}
