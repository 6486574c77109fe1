// file: src/chunker/mod.rs
// description: document chunking module exports
// reference: internal module structure

pub mod patterns;
pub mod segmenter;

pub use segmenter::{Chunker, ChunkerConfig};

use crate::error::Result;
use crate::models::{Chunk, ProvenanceHints};

/// Chunks with the default length thresholds.
pub fn chunk(text: &str, hints: &ProvenanceHints) -> Result<Vec<Chunk>> {
    Chunker::default().chunk(text, hints)
}
