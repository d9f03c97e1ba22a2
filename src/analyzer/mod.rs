pub mod backlog;
pub mod builder;
pub mod distribution;
pub mod integrity;
pub mod model;
pub mod sla;
pub mod stats;
pub mod temporal;
pub mod ttr;

pub use builder::{build_metrics, AnalysisContext};
pub use model::MetricsModel;
