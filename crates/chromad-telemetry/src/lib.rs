pub mod pipeline_metrics;

pub use pipeline_metrics::{LastDecision, PipelineMetrics, PipelineStage, RateTracker};
