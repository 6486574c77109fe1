// file: src/chunker/patterns.rs
// description: compiled regex patterns for paragraph, sentence and heading detection
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Blank line, possibly containing whitespace
    pub static ref PARAGRAPH_BREAK: Regex = Regex::new(
        r"\n\s*\n"
    ).expect("PARAGRAPH_BREAK regex is valid");

    // Run of non-terminal text plus its terminal punctuation
    pub static ref SENTENCE: Regex = Regex::new(
        r"[^.!?]+[.!?]*"
    ).expect("SENTENCE regex is valid");

    // Numeric outline, section sign, Article/Section/Clause headings
    pub static ref SECTION_HEADING: Regex = Regex::new(
        r"(?i)^(\d+\.[\d.]*|§\s*\d+(?:\.\d+)*|article\s+\d+|section\s+\d+|clause\s+\d+)"
    ).expect("SECTION_HEADING regex is valid");
}

/// Heading label usable as a section id, e.g. `Article_5` or `4.3`.
pub fn heading_label(text: &str) -> Option<String> {
    let captures = SECTION_HEADING.captures(text)?;
    let raw = captures.get(1)?.as_str();
    let label = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .trim_end_matches('.')
        .to_string();

    if label.is_empty() { None } else { Some(label) }
}
