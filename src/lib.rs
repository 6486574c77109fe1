// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod api;
pub mod audit;
pub mod chunker;
pub mod citation;
pub mod config;
pub mod error;
pub mod exporter;
pub mod generation;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod retrieval;
pub mod synthesis;
pub mod transform;
pub mod utils;

pub use api::{ActionHandler, ActionRequest, ActionResponse};
pub use audit::{AuditLogger, AuditStore, JsonlAuditStore, MemoryAuditStore};
pub use chunker::{Chunker, ChunkerConfig};
pub use citation::{extract_citations, resolve_cited_chunks};
pub use config::{
    AuditConfig, Config, GenerationConfig, RetrievalConfig, SupplementaryMode, SynthesisConfig,
    TransformConfig,
};
pub use error::{RagError, Result};
pub use exporter::{ExportManifest, JsonExporter};
pub use generation::{
    FnGenerator, GenerateOptions, Generator, OpenAiCompatClient, Prompt, RawResponse, RetryPolicy,
    Retrying,
};
pub use models::{
    AuditRecord, Chunk, Citation, Document, ProvenanceHints, RankedResult, ScoredChunk,
    SearchQuery, SourceType, StoredAuditRecord, SynthesisResult,
};
pub use parser::{DocumentLoader, MarkdownParser, TextNormalizer};
pub use pipeline::{BatchStats, ProgressTracker, RagOutcome, RagPipeline, RagRequest};
pub use retrieval::{rank, retrieve, score, search};
pub use synthesis::{SynthesisOrchestrator, synthesize};
pub use transform::{ComplexityReport, TransformOptions, TransformedQuery, analyze_complexity, transform};
pub use utils::{OperationTimer, PerformanceMetrics, Validator};
