// file: src/retrieval/mod.rs
// description: lexical retrieval module exports
// reference: internal module structure

pub mod ranker;
pub mod scorer;
pub mod search;

pub use ranker::{DEFAULT_TOP_K, rank};
pub use scorer::{score, tokenize_query};
pub use search::{merge_max, retrieve, score_all, score_passes, search};
