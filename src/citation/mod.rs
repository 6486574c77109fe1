// file: src/citation/mod.rs
// description: citation extraction module exports
// reference: internal module structure

pub mod extractor;
pub mod patterns;

pub use extractor::{extract_citations, resolve_cited_chunks};
