// file: src/retrieval/search.rs
// description: scoring passes for one or many search queries
// reference: https://docs.rs/futures/latest/futures/stream/trait.StreamExt.html#method.buffer_unordered

use crate::error::{RagError, Result};
use crate::models::{Chunk, RankedResult, ScoredChunk, SearchQuery};
use crate::retrieval::ranker::rank;
use crate::retrieval::scorer::{score_tokens, tokenize_query};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use tracing::debug;

pub fn score_all(chunks: &[Chunk], query: &str) -> Vec<ScoredChunk> {
    let tokens = tokenize_query(query);
    chunks
        .iter()
        .map(|chunk| ScoredChunk::new(chunk.clone(), score_tokens(chunk, &tokens)))
        .collect()
}

/// Single-query retrieval: score every chunk and keep the top `k`.
pub fn search(chunks: &[Chunk], query: &str, k: usize) -> RankedResult {
    rank(score_all(chunks, query), k)
}

/// Keeps each chunk's best score across passes, in chunk-index order.
pub fn merge_max<I>(passes: I) -> Vec<ScoredChunk>
where
    I: IntoIterator<Item = Vec<ScoredChunk>>,
{
    let mut best: BTreeMap<usize, ScoredChunk> = BTreeMap::new();

    for pass in passes {
        for scored in pass {
            match best.entry(scored.index) {
                Entry::Vacant(slot) => {
                    slot.insert(scored);
                }
                Entry::Occupied(mut slot) => {
                    if scored.score > slot.get().score {
                        slot.insert(scored);
                    }
                }
            }
        }
    }

    best.into_values().collect()
}

/// One scoring pass per query, run concurrently on the blocking pool.
pub async fn score_passes(
    chunks: Arc<Vec<Chunk>>,
    queries: &[SearchQuery],
    parallelism: usize,
) -> Result<Vec<ScoredChunk>> {
    if let [query] = queries {
        return Ok(score_all(&chunks, &query.text));
    }

    let tasks = queries.iter().map(|query| {
        let chunks = Arc::clone(&chunks);
        let text = query.text.clone();
        let origin = query.origin;

        async move {
            tokio::task::spawn_blocking(move || score_all(&chunks, &text))
                .await
                .map_err(|e| {
                    RagError::Task(format!(
                        "Scoring pass for {} query failed: {}",
                        origin.as_str(),
                        e
                    ))
                })
        }
    });

    let passes: Vec<Result<Vec<ScoredChunk>>> = stream::iter(tasks)
        .buffer_unordered(parallelism.max(1))
        .collect()
        .await;
    let passes = passes.into_iter().collect::<Result<Vec<_>>>()?;

    debug!(
        "Merged {} scoring passes over {} chunks",
        passes.len(),
        chunks.len()
    );
    Ok(merge_max(passes))
}

pub async fn retrieve(
    chunks: Arc<Vec<Chunk>>,
    queries: &[SearchQuery],
    parallelism: usize,
    k: usize,
) -> Result<RankedResult> {
    let scored = score_passes(chunks, queries, parallelism).await?;
    Ok(rank(scored, k))
}
