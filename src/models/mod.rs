// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod audit;
pub mod chunk;
pub mod citation;
pub mod document;
pub mod query;
pub mod synthesis;

pub use audit::{AuditRecord, StoredAuditRecord};
pub use chunk::{Chunk, RankedResult, ScoredChunk};
pub use citation::Citation;
pub use document::{Document, ProvenanceHints, SourceType};
pub use query::{QueryOrigin, SearchQuery};
pub use synthesis::SynthesisResult;
