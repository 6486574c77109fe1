// file: src/parser/mod.rs
// description: document loading and text preparation module exports
// reference: internal module structure

pub mod loader;
pub mod markdown;
pub mod normalizer;

pub use loader::DocumentLoader;
pub use markdown::{MarkdownParser, ParsedMarkdown};
pub use normalizer::TextNormalizer;
