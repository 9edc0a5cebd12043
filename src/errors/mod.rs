pub mod types;
pub mod classification;
pub mod retry;

pub use types::ScanwatchError;
pub use classification::ErrorClassification;
pub use retry::{with_retry, PollBackoff, ReconnectPolicy, RetryConfig};
