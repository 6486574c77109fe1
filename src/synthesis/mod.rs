// file: src/synthesis/mod.rs
// description: answer synthesis module exports
// reference: internal module structure

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{SYNTHESIS_TEMPERATURE, SynthesisOrchestrator, synthesize};
pub use prompt::{NO_ANSWER, build_prompt, degraded_answer};
