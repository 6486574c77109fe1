// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod batch;
pub mod orchestrator;
pub mod progress;

pub use batch::{BatchAnswer, parse_questions, run_batch};
pub use orchestrator::{RagOutcome, RagPipeline, RagRequest};
pub use progress::{BatchStats, ProgressTracker};
