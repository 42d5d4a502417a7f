//! Pipeline orchestration, state machine and reporting.

pub mod orchestrator;
pub mod report;
pub mod state;

// Re-export main types
pub use orchestrator::{Pipeline, PipelineConfig, PipelineRun};
pub use report::render_summary;
pub use state::{PipelineStage, PipelineState};
