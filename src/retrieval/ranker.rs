// file: src/retrieval/ranker.rs
// description: deterministic top-k ranking of scored chunks
// reference: score descending, ties by ascending chunk index

use crate::models::{RankedResult, ScoredChunk};
use std::cmp::Reverse;

pub const DEFAULT_TOP_K: usize = 5;

pub fn rank(mut scored: Vec<ScoredChunk>, k: usize) -> RankedResult {
    scored.sort_by_key(|s| (Reverse(s.score), s.chunk.index));
    scored.truncate(k);
    RankedResult::from_sorted(scored)
}
