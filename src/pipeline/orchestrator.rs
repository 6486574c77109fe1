// file: src/pipeline/orchestrator.rs
// description: end-to-end request flow from document and question to audited answer
// reference: chunk, transform, retrieve, synthesize, cite, audit

use crate::audit::AuditLogger;
use crate::chunker::{Chunker, ChunkerConfig};
use crate::citation::{extract_citations, resolve_cited_chunks};
use crate::config::{Config, SupplementaryMode};
use crate::error::Result;
use crate::generation::{Generator, RetryPolicy, Retrying};
use crate::models::{AuditRecord, Chunk, Citation, Document, RankedResult, ScoredChunk, SynthesisResult};
use crate::retrieval::{retrieve, search};
use crate::synthesis::SynthesisOrchestrator;
use crate::transform::{
    TransformOptions, TransformOverrides, TransformedQuery, analyze_complexity, transform,
};
use crate::utils::{OperationTimer, Validator};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SLOW_REQUEST: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Default)]
pub struct RagRequest {
    pub query: String,
    /// Audit records are written only when set.
    pub user_id: Option<String>,
    pub top_k: Option<usize>,
    /// Extra ids recorded in the audit trail alongside the document's own.
    pub document_ids: Vec<String>,
    pub transform: Option<TransformOverrides>,
}

impl RagRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_document_ids(mut self, ids: Vec<String>) -> Self {
        self.document_ids = ids;
        self
    }

    pub fn with_transform(mut self, overrides: TransformOverrides) -> Self {
        self.transform = Some(overrides);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RagOutcome {
    pub request_id: Uuid,
    pub chunk_count: usize,
    pub transformed: TransformedQuery,
    pub synthesis: SynthesisResult,
    /// Sub-question passages shown to the model in addition to the ranking
    pub additional_context: Vec<ScoredChunk>,
    pub citations: Vec<Citation>,
    pub cited_chunk_ids: Vec<usize>,
    pub audit_id: Option<i64>,
    pub latency_ms: u64,
}

pub struct RagPipeline {
    config: Config,
    generator: Arc<dyn Generator>,
    chunker: Chunker,
    audit: AuditLogger,
}

impl RagPipeline {
    pub fn new(config: Config, generator: Arc<dyn Generator>, audit: AuditLogger) -> Self {
        let chunker = Chunker::new(ChunkerConfig::from(&config.retrieval));
        Self {
            config,
            generator,
            chunker,
            audit,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        self.chunker.chunk(&document.content, &document.hints())
    }

    /// Chunk and rank without any model call.
    pub fn search(&self, document: &Document, query: &str, top_k: Option<usize>) -> Result<RankedResult> {
        Validator::validate_query(query)?;
        let top_k = top_k.unwrap_or(self.config.retrieval.top_k);
        Validator::validate_top_k(top_k)?;
        let chunks = self.chunk(document)?;
        Ok(search(&chunks, query, top_k))
    }

    pub fn transform_options(&self, query: &str, overrides: Option<&TransformOverrides>) -> TransformOptions {
        let configured = TransformOverrides::from(&self.config.transform);
        let overrides = overrides.unwrap_or(&configured);
        let report = self
            .config
            .transform
            .use_complexity_hints
            .then(|| analyze_complexity(query));
        TransformOptions::resolve(overrides, report.as_ref())
    }

    pub async fn answer(&self, document: &Document, request: &RagRequest) -> Result<RagOutcome> {
        Validator::validate_query(&request.query)?;
        let top_k = request.top_k.unwrap_or(self.config.retrieval.top_k);
        Validator::validate_top_k(top_k)?;
        let request_id = Uuid::new_v4();
        let timer = OperationTimer::new(&format!("rag request {}", request_id));
        let query = request.query.trim();

        let chunks = Arc::new(self.chunk(document)?);
        let chunk_count = chunks.len();
        timer.checkpoint(&format!("{} chunks", chunk_count));

        let options = self.transform_options(query, request.transform.as_ref());
        let transformed = if options.any() {
            let transformer = Retrying::new(
                Arc::clone(&self.generator),
                RetryPolicy::from(&self.config.transform)
                    .with_timeout(self.config.generation.timeout()),
            );
            transform(query, &transformer, &options).await
        } else {
            TransformedQuery::untransformed(query)
        };

        let parallelism = self.config.retrieval.parallel_passes;
        let (ranked, additional_context) = match self.config.transform.supplementary {
            SupplementaryMode::Union => {
                let ranked = retrieve(Arc::clone(&chunks), &transformed.search_queries, parallelism, top_k).await?;
                (ranked, Vec::new())
            }
            SupplementaryMode::Context => {
                let ranked = retrieve(Arc::clone(&chunks), &transformed.primary_queries(), parallelism, top_k).await?;
                let additional = self.supplementary_context(&chunks, &transformed, &ranked);
                (ranked, additional)
            }
        };
        timer.checkpoint(&format!("ranked {} passages", ranked.len()));

        let orchestrator = SynthesisOrchestrator::from_config(
            Arc::clone(&self.generator),
            &self.config.synthesis,
            Some(self.config.generation.timeout()),
        );
        let synthesis = orchestrator
            .synthesize_with_context(query, ranked, &additional_context)
            .await;

        let citations = extract_citations(&synthesis.answer);
        let cited_chunk_ids = resolve_cited_chunks(&citations, &synthesis.ranked_chunks);
        debug!(
            "Recovered {} citations covering {} chunks",
            citations.len(),
            cited_chunk_ids.len()
        );

        let latency_ms = timer.elapsed_ms();
        timer.warn_if_slow(SLOW_REQUEST, "answering");

        let audit_id = match &request.user_id {
            Some(user_id) => {
                let record = AuditRecord {
                    user_id: user_id.clone(),
                    query_text: query.to_string(),
                    retrieved_chunk_ids: synthesis.ranked_chunks.chunk_indices(),
                    chunks_fed_to_model: synthesis
                        .ranked_chunks
                        .iter()
                        .chain(additional_context.iter())
                        .map(|c| c.index)
                        .collect(),
                    cited_chunk_ids: cited_chunk_ids.clone(),
                    model_response: synthesis.answer.clone(),
                    document_ids: document_ids(document, &request.document_ids),
                    latency_ms,
                };
                self.audit.log(&record).await
            }
            None => None,
        };

        if synthesis.degraded {
            warn!("Request {} answered with a degraded extractive answer", request_id);
        }
        timer.finish();
        info!(
            "Answered request {} from {} chunks ({} search queries)",
            request_id,
            chunk_count,
            transformed.search_queries.len()
        );

        Ok(RagOutcome {
            request_id,
            chunk_count,
            transformed,
            synthesis,
            additional_context,
            citations,
            cited_chunk_ids,
            audit_id,
            latency_ms,
        })
    }

    /// Best passage per sub-question, skipping passages already ranked.
    fn supplementary_context(
        &self,
        chunks: &[Chunk],
        transformed: &TransformedQuery,
        ranked: &RankedResult,
    ) -> Vec<ScoredChunk> {
        let mut used: HashSet<usize> = ranked.chunk_indices().into_iter().collect();

        transformed
            .sub_question_queries()
            .iter()
            .take(self.config.transform.max_supplementary_queries)
            .filter_map(|question| search(chunks, &question.text, 1).into_vec().into_iter().next())
            .filter(|passage| used.insert(passage.index))
            .collect()
    }
}

fn document_ids(document: &Document, extra: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(&document.id)
        .chain(extra.iter())
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditStore;
    use crate::audit::AuditStore;
    use crate::error::RagError;
    use crate::generation::{FnGenerator, Prompt, RawResponse};
    use std::sync::Mutex;

    const DOCUMENT: &str = "A cat sat. A dog ran. A cat and dog played.";

    fn config() -> Config {
        let mut config = Config::default();
        config.transform.expansion = Some(false);
        config
    }

    fn answering(reply: &'static str, prompts: Arc<Mutex<Vec<String>>>) -> Arc<dyn Generator> {
        Arc::new(FnGenerator::new(move |prompt: Prompt, _| {
            let prompts = Arc::clone(&prompts);
            async move {
                if let Prompt::Text(text) = prompt {
                    prompts.lock().unwrap().push(text);
                }
                Ok(RawResponse::Text(reply.to_string()))
            }
        }))
    }

    #[tokio::test]
    async fn test_answer_with_citations_and_audit() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = RagPipeline::new(
            config(),
            answering("Cats sit [Source 1] and play [Source 2].", Arc::clone(&prompts)),
            AuditLogger::new(store.clone()),
        );
        let document = Document::from_text(DOCUMENT);

        let outcome = pipeline
            .answer(&document, &RagRequest::new("cat").with_user("u-1"))
            .await
            .unwrap();

        assert_eq!(outcome.chunk_count, 3);
        assert!(!outcome.synthesis.degraded);
        assert_eq!(outcome.synthesis.ranked_chunks.chunk_indices(), vec![0, 2, 1]);
        assert_eq!(outcome.citations.len(), 2);
        assert_eq!(outcome.cited_chunk_ids, vec![0, 2]);
        assert_eq!(outcome.audit_id, Some(1));
        assert_eq!(prompts.lock().unwrap().len(), 1);

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.record.query_text, "cat");
        assert_eq!(stored.record.retrieved_chunk_ids, vec![0, 2, 1]);
        assert_eq!(stored.record.cited_chunk_ids, vec![0, 2]);
        assert_eq!(stored.record.document_ids, vec![document.id.clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_model_still_answers() {
        let generator: Arc<dyn Generator> = Arc::new(FnGenerator::new(|_, _| async {
            Err(RagError::Upstream("503 UNAVAILABLE".into()))
        }));
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = RagPipeline::new(config(), generator, AuditLogger::new(store.clone()));

        let outcome = pipeline
            .answer(&Document::from_text(DOCUMENT), &RagRequest::new("cat").with_user("u-2"))
            .await
            .unwrap();

        assert!(outcome.synthesis.degraded);
        assert!(outcome.synthesis.answer.starts_with("Found 3 relevant passages"));
        assert!(outcome.citations.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let pipeline = RagPipeline::new(config(), answering("x", prompts), AuditLogger::disabled());

        let result = pipeline
            .answer(&Document::from_text("   \n\n  "), &RagRequest::new("cat"))
            .await;
        assert!(matches!(result, Err(RagError::EmptyDocument)));
    }

    #[tokio::test]
    async fn test_answers_when_audit_log_cannot_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data"), "a file, not a directory").unwrap();
        let mut config = config();
        config.audit.path = dir.path().join("data").join("audit.jsonl");

        let audit = AuditLogger::from_config_or_disabled(&config.audit).await;
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let pipeline = RagPipeline::new(config, answering("Cats sit [Source 1].", prompts), audit);

        let outcome = pipeline
            .answer(&Document::from_text(DOCUMENT), &RagRequest::new("cat").with_user("u-1"))
            .await
            .unwrap();
        assert_eq!(outcome.synthesis.answer, "Cats sit [Source 1].");
        assert_eq!(outcome.cited_chunk_ids, vec![0]);
        assert_eq!(outcome.audit_id, None);
    }

    #[tokio::test]
    async fn test_zero_top_k_is_rejected_before_generation() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let pipeline = RagPipeline::new(
            config(),
            answering("x", Arc::clone(&prompts)),
            AuditLogger::disabled(),
        );
        let document = Document::from_text(DOCUMENT);

        let result = pipeline
            .answer(&document, &RagRequest::new("cat").with_top_k(0))
            .await;
        assert!(matches!(result, Err(RagError::Validation(_))));
        assert!(prompts.lock().unwrap().is_empty());

        assert!(pipeline.search(&document, "cat", Some(0)).is_err());
        assert_eq!(pipeline.search(&document, "cat", Some(2)).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_user_means_no_audit() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = RagPipeline::new(
            config(),
            answering("answer", prompts),
            AuditLogger::new(store.clone()),
        );

        let outcome = pipeline
            .answer(&Document::from_text(DOCUMENT), &RagRequest::new("dog").with_top_k(1))
            .await
            .unwrap();
        assert_eq!(outcome.audit_id, None);
        assert_eq!(outcome.synthesis.ranked_chunks.len(), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_context_mode_adds_sub_question_passages() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator: Arc<dyn Generator> = {
            let prompts = Arc::clone(&prompts);
            Arc::new(FnGenerator::new(move |prompt: Prompt, _| {
                let prompts = Arc::clone(&prompts);
                async move {
                    let Prompt::Text(text) = prompt else {
                        return Err(RagError::Upstream("expected text".into()));
                    };
                    let reply = if text.starts_with("Split") {
                        "[\"Where are the zebras kept?\"]".to_string()
                    } else {
                        prompts.lock().unwrap().push(text);
                        "synthesized".to_string()
                    };
                    Ok(RawResponse::Text(reply))
                }
            }))
        };

        let mut config = config();
        config.transform.decomposition = Some(true);
        config.transform.supplementary = SupplementaryMode::Context;
        let pipeline = RagPipeline::new(config, generator, AuditLogger::disabled());

        let mut content = String::from("Opening remarks about the park and its history.");
        for i in 0..25 {
            content.push_str(&format!("\n\nFiller paragraph number {} about nothing.", i));
        }
        content.push_str("\n\nThe zebras are kept in the northern enclosure.");

        let outcome = pipeline
            .answer(&Document::from_text(content), &RagRequest::new("opening remarks").with_top_k(1))
            .await
            .unwrap();

        assert_eq!(outcome.synthesis.ranked_chunks.chunk_indices(), vec![0]);
        assert_eq!(outcome.additional_context.len(), 1);
        assert_eq!(outcome.additional_context[0].index, 26);

        let prompts = prompts.lock().unwrap();
        assert!(prompts[0].contains("ADDITIONAL CONTEXT"));
        assert!(prompts[0].contains("northern enclosure"));
    }

    #[test]
    fn test_document_ids_are_deduplicated() {
        let document = Document::from_text("content");
        let ids = document_ids(&document, &[document.id.clone(), "other".to_string()]);
        assert_eq!(ids, vec![document.id.clone(), "other".to_string()]);
    }
}
