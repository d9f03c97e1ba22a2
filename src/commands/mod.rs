pub mod analyze;
pub mod extract;
pub mod pipeline;

pub use analyze::{analyze_table, AnalyzeResult};
pub use extract::{extract_tickets, ExtractResult};
pub use pipeline::{run_pipeline, watch, PipelineResult};
