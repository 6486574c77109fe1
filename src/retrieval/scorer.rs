// file: src/retrieval/scorer.rs
// description: lexical relevance scoring of chunks against a query
// reference: whole-word term frequency with a positional prior

use crate::models::Chunk;
use std::collections::HashMap;

pub const TERM_WEIGHT: u32 = 10;
pub const POSITIONAL_PRIOR: u32 = 20;
pub const MAX_SCORE: u32 = 100;
/// Query tokens must be longer than this.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Lowercased query words longer than two characters, duplicates kept.
pub fn tokenize_query(query: &str) -> Vec<String> {
    words(&query.to_lowercase())
        .filter(|word| word.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
}

fn word_counts(text: &str) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for word in words(text) {
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

fn positional_prior(index: usize) -> u32 {
    POSITIONAL_PRIOR.saturating_sub(index.min(POSITIONAL_PRIOR as usize) as u32)
}

/// Score with query tokens already extracted, for scoring many chunks per query.
pub fn score_tokens(chunk: &Chunk, tokens: &[String]) -> u8 {
    let lowered = chunk.text.to_lowercase();
    let counts = word_counts(&lowered);

    let term_score: u32 = tokens
        .iter()
        .map(|token| TERM_WEIGHT.saturating_mul(counts.get(token.as_str()).copied().unwrap_or(0)))
        .fold(0u32, u32::saturating_add);

    term_score
        .saturating_add(positional_prior(chunk.index))
        .min(MAX_SCORE) as u8
}

pub fn score(chunk: &Chunk, query: &str) -> u8 {
    score_tokens(chunk, &tokenize_query(query))
}
