// file: src/transform/complexity.rs
// description: query complexity heuristic suggesting which transforms to enable
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref COMPARISON: Regex = Regex::new(
        r"(?i)\b(vs|versus|compare|difference|better)\b"
    ).expect("COMPARISON regex is valid");

    static ref CONJUNCTION: Regex = Regex::new(
        r"(?i)\b(and|also|additionally|furthermore)\b"
    ).expect("CONJUNCTION regex is valid");

    static ref TECHNICAL: Regex = Regex::new(
        r"(?i)\b(error|bug|fix|implement|code|function|api)\b"
    ).expect("TECHNICAL regex is valid");
}

const VAGUE_BELOW_WORDS: usize = 5;
const COMPLEX_ABOVE_WORDS: usize = 15;
const HYDE_ABOVE_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SuggestedTransforms {
    pub expansion: bool,
    pub decomposition: bool,
    pub hyde: bool,
    pub step_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplexityReport {
    pub word_count: usize,
    pub is_vague: bool,
    pub is_complex: bool,
    pub is_technical: bool,
    pub suggested_transforms: SuggestedTransforms,
}

/// Suggestions only; explicit caller flags always win (see `TransformOptions::resolve`).
pub fn analyze_complexity(query: &str) -> ComplexityReport {
    let word_count = query.split_whitespace().count();
    let has_comparison = COMPARISON.is_match(query);
    let has_multiple_parts = CONJUNCTION.is_match(query);
    let is_technical = TECHNICAL.is_match(query);
    let is_vague = word_count < VAGUE_BELOW_WORDS;

    ComplexityReport {
        word_count,
        is_vague,
        is_complex: has_comparison || has_multiple_parts || word_count > COMPLEX_ABOVE_WORDS,
        is_technical,
        suggested_transforms: SuggestedTransforms {
            expansion: is_vague,
            decomposition: has_comparison || has_multiple_parts,
            hyde: !is_technical && word_count > HYDE_ABOVE_WORDS,
            step_back: is_technical,
        },
    }
}
