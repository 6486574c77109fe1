// file: src/models/chunk.rs
// description: provenance-tagged passages, their scores, and ranked result sets
// reference: internal data structures

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the document, starting at 0.
    pub index: usize,

    /// Trimmed, non-empty passage text
    pub text: String,

    pub page_number: Option<u32>,

    /// Display-only identifier; never used for ordering.
    pub section_id: Option<String>,

    /// Character offset of the first character (inclusive)
    pub start_char: usize,

    /// Character offset past the last character (exclusive)
    pub end_char: usize,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,

    /// Relevance in [0, 100]
    pub score: u8,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, score: u8) -> Self {
        Self {
            chunk,
            score: score.min(100),
        }
    }
}

impl Deref for ScoredChunk {
    type Target = Chunk;

    fn deref(&self) -> &Self::Target {
        &self.chunk
    }
}

/// Scored chunks sorted by score descending, ties by ascending chunk index.
///
/// Built by [`crate::retrieval::rank`]; deserializing re-sorts and re-clamps, so the
/// ordering invariant holds for stored results too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedResult(Vec<ScoredChunk>);

impl<'de> Deserialize<'de> for RankedResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut chunks: Vec<ScoredChunk> = Vec::<ScoredChunk>::deserialize(deserializer)?
            .into_iter()
            .map(|c| ScoredChunk::new(c.chunk, c.score))
            .collect();
        chunks.sort_by_key(|c| (Reverse(c.score), c.index));
        Ok(Self(chunks))
    }
}

impl RankedResult {
    pub(crate) fn from_sorted(chunks: Vec<ScoredChunk>) -> Self {
        Self(chunks)
    }

    pub fn top(&self) -> Option<&ScoredChunk> {
        self.0.first()
    }

    pub fn chunk_indices(&self) -> Vec<usize> {
        self.0.iter().map(|c| c.index).collect()
    }

    pub fn into_vec(self) -> Vec<ScoredChunk> {
        self.0
    }
}

impl Deref for RankedResult {
    type Target = [ScoredChunk];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for RankedResult {
    type Item = ScoredChunk;
    type IntoIter = std::vec::IntoIter<ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            text: text.to_string(),
            page_number: None,
            section_id: None,
            start_char: 0,
            end_char: text.chars().count(),
        }
    }

    #[test]
    fn test_scored_chunk_clamps() {
        let scored = ScoredChunk::new(chunk(0, "hello"), 250);
        assert_eq!(scored.score, 100);
        assert_eq!(scored.text, "hello");
        assert_eq!(scored.char_len(), 5);
    }

    #[test]
    fn test_scored_chunk_serializes_flat() {
        let scored = ScoredChunk::new(chunk(2, "passage"), 40);
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["index"], 2);
        assert_eq!(value["score"], 40);
        assert_eq!(value["text"], "passage");
    }

    #[test]
    fn test_ranked_result_accessors() {
        let ranked = RankedResult::from_sorted(vec![
            ScoredChunk::new(chunk(3, "c"), 50),
            ScoredChunk::new(chunk(1, "a"), 20),
        ]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked.top().map(|c| c.index), Some(3));
        assert_eq!(ranked.chunk_indices(), vec![3, 1]);
    }

    #[test]
    fn test_deserialized_ranking_is_reordered() {
        let value = serde_json::json!([
            { "index": 4, "text": "d", "page_number": null, "section_id": null, "start_char": 0, "end_char": 1, "score": 10 },
            { "index": 2, "text": "b", "page_number": null, "section_id": null, "start_char": 0, "end_char": 1, "score": 40 },
            { "index": 1, "text": "a", "page_number": null, "section_id": null, "start_char": 0, "end_char": 1, "score": 10 },
            { "index": 7, "text": "g", "page_number": null, "section_id": null, "start_char": 0, "end_char": 1, "score": 200 }
        ]);
        let ranked: RankedResult = serde_json::from_value(value).unwrap();

        assert_eq!(ranked.chunk_indices(), vec![7, 2, 1, 4]);
        assert_eq!(ranked.top().map(|c| c.score), Some(100));
    }
}
