// file: src/models/synthesis.rs
// description: synthesized answer together with the passages it was grounded on
// reference: internal data structures

use crate::models::RankedResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub answer: String,
    pub ranked_chunks: RankedResult,
    /// True when the answer is the extractive fallback, not model output.
    pub degraded: bool,
}
