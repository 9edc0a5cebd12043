pub mod aggregator;
pub mod samples;

pub use aggregator::{recompute, AggregatedView, SeverityCount, ToolPerformance};
pub use samples::{MetricSample, SampleSeries};
