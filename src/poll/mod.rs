pub mod fallback;
pub mod fetcher;

pub use fallback::{PollFallback, PollScope};
pub use fetcher::{HttpResultsFetcher, ResultsFetcher};
