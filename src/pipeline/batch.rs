// file: src/pipeline/batch.rs
// description: answers a list of questions against one document
// reference: https://docs.rs/futures/latest/futures/stream/trait.StreamExt.html#method.buffered

use crate::models::{Citation, Document, RankedResult};
use crate::pipeline::orchestrator::{RagPipeline, RagRequest};
use crate::pipeline::progress::ProgressTracker;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, Serialize)]
pub struct BatchAnswer {
    /// 1-based position in the question list
    pub number: usize,
    pub question: String,
    pub answer: Option<String>,
    pub degraded: bool,
    pub ranked_chunks: RankedResult,
    pub citations: Vec<Citation>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Questions file format: one question per line, blank lines and `#` comments skipped.
pub fn parse_questions(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Results come back in question order regardless of `concurrency`.
pub async fn run_batch(
    pipeline: &RagPipeline,
    document: &Document,
    questions: &[String],
    user_id: Option<&str>,
    concurrency: usize,
    progress: &ProgressTracker,
) -> Vec<BatchAnswer> {
    let tasks = questions.iter().enumerate().map(|(i, question)| async move {
        let mut request = RagRequest::new(question.clone());
        if let Some(user) = user_id {
            request = request.with_user(user);
        }

        match pipeline.answer(document, &request).await {
            Ok(outcome) => {
                progress.record_answered(outcome.synthesis.degraded);
                BatchAnswer {
                    number: i + 1,
                    question: question.clone(),
                    answer: Some(outcome.synthesis.answer),
                    degraded: outcome.synthesis.degraded,
                    ranked_chunks: outcome.synthesis.ranked_chunks,
                    citations: outcome.citations,
                    latency_ms: outcome.latency_ms,
                    error: None,
                }
            }
            Err(e) => {
                error!("Question {} failed: {}", i + 1, e);
                progress.record_failed();
                BatchAnswer {
                    number: i + 1,
                    question: question.clone(),
                    answer: None,
                    degraded: false,
                    ranked_chunks: RankedResult::default(),
                    citations: Vec::new(),
                    latency_ms: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    });

    stream::iter(tasks)
        .buffered(concurrency.max(1))
        .collect()
        .await
}
