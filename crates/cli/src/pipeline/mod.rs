//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{resolve_port, Pipeline, PipelineConfig};
pub use stats::print_report;
