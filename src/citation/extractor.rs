// file: src/citation/extractor.rs
// description: recovers structured citations from synthesized answers
// reference: best-effort bracket grammar matching

use crate::citation::patterns::CITATION;
use crate::models::{Citation, RankedResult};
use std::collections::HashSet;
use tracing::debug;

/// Left to right, non-overlapping. No match is an empty list.
pub fn extract_citations(answer: &str) -> Vec<Citation> {
    let mut citations = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for captures in CITATION.captures_iter(answer) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        char_cursor += answer[byte_cursor..whole.start()].chars().count();
        byte_cursor = whole.start();

        let Some(doc_ref) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            debug!("Skipping citation with unreadable source number: {}", whole.as_str());
            continue;
        };

        citations.push(Citation {
            doc_ref,
            page_number: captures.get(2).and_then(|m| m.as_str().parse().ok()),
            section_id: captures.get(3).map(|m| m.as_str().to_string()),
            matched_text: whole.as_str().to_string(),
            position: char_cursor,
        });
    }

    citations
}

/// Chunk indices for cited sources; `[Source N]` is the N-th ranked chunk.
pub fn resolve_cited_chunks(citations: &[Citation], ranked: &RankedResult) -> Vec<usize> {
    let mut seen = HashSet::new();

    citations
        .iter()
        .filter_map(|citation| {
            let position = (citation.doc_ref as usize).checked_sub(1)?;
            ranked.get(position).map(|chunk| chunk.index)
        })
        .filter(|index| seen.insert(*index))
        .collect()
}
