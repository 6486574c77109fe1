// file: src/synthesis/orchestrator.rs
// description: synthesis call with bounded retry and extractive degradation
// reference: retrieval success is never undone by a failed model call

use crate::config::SynthesisConfig;
use crate::generation::{GenerateOptions, Generator, Prompt, RetryPolicy, generate_with_retry};
use crate::models::{RankedResult, ScoredChunk, SynthesisResult};
use crate::synthesis::prompt::{NO_ANSWER, build_prompt, degraded_answer};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SYNTHESIS_TEMPERATURE: f32 = 0.3;

pub struct SynthesisOrchestrator<G> {
    generator: G,
    policy: RetryPolicy,
    temperature: f32,
}

impl<G: Generator> SynthesisOrchestrator<G> {
    pub fn new(generator: G, policy: RetryPolicy, temperature: f32) -> Self {
        Self {
            generator,
            policy,
            temperature,
        }
    }

    pub fn from_config(generator: G, config: &SynthesisConfig, call_timeout: Option<Duration>) -> Self {
        let mut policy = RetryPolicy::from(config);
        if let Some(timeout) = call_timeout {
            policy = policy.with_timeout(timeout);
        }
        Self::new(generator, policy, config.temperature)
    }

    pub async fn synthesize(&self, query: &str, ranked: RankedResult) -> SynthesisResult {
        self.synthesize_with_context(query, ranked, &[]).await
    }

    /// `additional` passages are shown to the model after the ranked ones.
    pub async fn synthesize_with_context(
        &self,
        query: &str,
        ranked: RankedResult,
        additional: &[ScoredChunk],
    ) -> SynthesisResult {
        synthesize_with(
            query,
            ranked,
            additional,
            &self.generator,
            &self.policy,
            self.temperature,
        )
        .await
    }
}

/// Default policy: three attempts, 500ms linear backoff.
pub async fn synthesize<G: Generator + ?Sized>(
    query: &str,
    ranked: RankedResult,
    generator: &G,
) -> SynthesisResult {
    synthesize_with(
        query,
        ranked,
        &[],
        generator,
        &RetryPolicy::default(),
        SYNTHESIS_TEMPERATURE,
    )
    .await
}

async fn synthesize_with<G: Generator + ?Sized>(
    query: &str,
    ranked: RankedResult,
    additional: &[ScoredChunk],
    generator: &G,
    policy: &RetryPolicy,
    temperature: f32,
) -> SynthesisResult {
    let prompt = Prompt::Text(build_prompt(query, &ranked, additional));
    debug!(
        "Synthesis prompt has {} chars over {} passages",
        prompt.char_len(),
        ranked.len() + additional.len()
    );

    let options = GenerateOptions::new(temperature);
    match generate_with_retry(generator, &prompt, &options, policy).await {
        Ok(response) => {
            let text = response.into_text();
            let answer = match text.trim() {
                "" => NO_ANSWER.to_string(),
                trimmed => trimmed.to_string(),
            };
            info!("Synthesis complete ({} chars)", answer.chars().count());
            SynthesisResult {
                answer,
                ranked_chunks: ranked,
                degraded: false,
            }
        }
        Err(e) => {
            warn!("Synthesis unavailable, answering extractively: {}", e);
            SynthesisResult {
                answer: degraded_answer(&ranked),
                ranked_chunks: ranked,
                degraded: true,
            }
        }
    }
}
