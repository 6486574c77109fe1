// file: src/api/action.rs
// description: rag, scrape and chat action contract for the HTTP collaborator
// reference: https://docs.rs/schemars

use crate::error::{RagError, Result};
use crate::generation::{ChatMessage, GenerateOptions, Prompt, RetryPolicy, generate_with_retry};
use crate::models::{ScoredChunk, SourceType};
use crate::parser::DocumentLoader;
use crate::pipeline::{RagOutcome, RagPipeline, RagRequest};
use crate::utils::Validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const SCRAPE_FAILURE_SENTINEL: &str = "ERROR:UNABLE_TO_SCRAPE";
const SCRAPE_TEMPERATURE: f32 = 0.0;
const CHAT_TEMPERATURE: f32 = 0.7;

const CHAT_PERSONA: &str = "You are a sharp, confident research assistant. You help users take \
apart documents and work through difficult questions, answering with clarity and precision. \
Use earlier turns of the conversation as context. When a new conversation starts, greet the \
user and state your purpose.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", content = "payload", rename_all = "lowercase")]
pub enum ActionRequest {
    Rag(RagPayload),
    Scrape(ScrapePayload),
    Chat(ChatPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RagPayload {
    pub document_content: String,
    pub query: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScrapePayload {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChatPayload {
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChatTurn {
    /// `user`; any other role is treated as the model
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ActionResponse {
    Rag(RagResponse),
    Scrape(ScrapeResponse),
    Chat(ChatResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RagResponse {
    pub synthesized_answer: String,
    /// Sorted by relevance score, highest first
    pub ranked_chunks: Vec<RankedChunkView>,
    pub degraded: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedChunkView {
    pub relevance_score: u8,
    pub chunk_text: String,
    pub source_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScrapeResponse {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&ScoredChunk> for RankedChunkView {
    fn from(chunk: &ScoredChunk) -> Self {
        Self {
            relevance_score: chunk.score,
            chunk_text: chunk.text.clone(),
            source_index: chunk.index,
            page_number: chunk.page_number,
            section_id: chunk.section_id.clone(),
        }
    }
}

impl From<&RagOutcome> for RagResponse {
    fn from(outcome: &RagOutcome) -> Self {
        Self {
            synthesized_answer: outcome.synthesis.answer.clone(),
            ranked_chunks: outcome
                .synthesis
                .ranked_chunks
                .iter()
                .map(RankedChunkView::from)
                .collect(),
            degraded: outcome.synthesis.degraded,
            latency_ms: outcome.latency_ms,
        }
    }
}

fn scrape_prompt(url: &str) -> String {
    format!(
        "You are a web content extraction agent. Fetch the page below and return its main text.\n\n\
         URL: {url}\n\n\
         1. Access the page content.\n\
         2. Keep the primary article or page text.\n\
         3. Drop navigation, ads and other boilerplate.\n\
         4. Return only the clean body text.\n\
         5. If the page cannot be accessed, reply with exactly: {SCRAPE_FAILURE_SENTINEL}"
    )
}

pub struct ActionHandler {
    pipeline: Arc<RagPipeline>,
    loader: DocumentLoader,
}

impl ActionHandler {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self {
            pipeline,
            loader: DocumentLoader::new(),
        }
    }

    pub async fn handle(&self, request: ActionRequest) -> Result<ActionResponse> {
        match request {
            ActionRequest::Rag(payload) => self.rag(payload).await.map(ActionResponse::Rag),
            ActionRequest::Scrape(payload) => self.scrape(payload).await.map(ActionResponse::Scrape),
            ActionRequest::Chat(payload) => self.chat(payload).await.map(ActionResponse::Chat),
        }
    }

    /// Status code and JSON body, as the HTTP collaborator would send them.
    pub async fn handle_json(&self, body: &str) -> (u16, Value) {
        let request: ActionRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected malformed action request: {}", e);
                return (400, error_body(&format!("Invalid action request: {}", e)));
            }
        };

        let outcome = self
            .handle(request)
            .await
            .and_then(|response| Ok(serde_json::to_value(response)?));
        match outcome {
            Ok(value) => (200, value),
            Err(e) => (e.status_code(), error_body(&e.to_string())),
        }
    }

    async fn rag(&self, payload: RagPayload) -> Result<RagResponse> {
        if payload.document_content.trim().is_empty() || payload.query.trim().is_empty() {
            return Err(RagError::Validation(
                "Missing documentContent or query".to_string(),
            ));
        }

        let document = self.loader.from_content(
            &payload.document_content,
            SourceType::Text,
            "payload".to_string(),
        )?;

        let mut request = RagRequest::new(payload.query).with_document_ids(payload.document_ids);
        if let Some(user) = payload.user_id {
            request = request.with_user(user);
        }

        let outcome = self.pipeline.answer(&document, &request).await?;
        Ok(RagResponse::from(&outcome))
    }

    async fn scrape(&self, payload: ScrapePayload) -> Result<ScrapeResponse> {
        Validator::validate_url(&payload.url)?;
        info!("Scraping {}", payload.url);

        let response = generate_with_retry(
            self.pipeline.generator().as_ref(),
            &Prompt::Text(scrape_prompt(&payload.url)),
            &GenerateOptions::new(SCRAPE_TEMPERATURE),
            &self.retry_policy(),
        )
        .await?;

        let content = response.into_text().trim().to_string();
        if content.is_empty() || content == SCRAPE_FAILURE_SENTINEL {
            return Err(RagError::Scrape(format!(
                "The model could not access or extract content from {}",
                payload.url
            )));
        }
        Ok(ScrapeResponse { content })
    }

    async fn chat(&self, payload: ChatPayload) -> Result<ChatResponse> {
        if payload.history.is_empty() {
            return Err(RagError::Validation("Missing or empty history".to_string()));
        }

        let messages = payload
            .history
            .into_iter()
            .map(|turn| match turn.role.as_str() {
                "user" => ChatMessage::user(turn.content),
                _ => ChatMessage::model(turn.content),
            })
            .collect();

        let options = GenerateOptions::new(CHAT_TEMPERATURE).with_system_instruction(CHAT_PERSONA);
        let response = generate_with_retry(
            self.pipeline.generator().as_ref(),
            &Prompt::Messages(messages),
            &options,
            &self.retry_policy(),
        )
        .await?;

        Ok(ChatResponse {
            response: response.into_text(),
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        let config = self.pipeline.config();
        RetryPolicy::from(&config.synthesis).with_timeout(config.generation.timeout())
    }
}

fn error_body(message: &str) -> Value {
    serde_json::to_value(ErrorBody {
        error: message.to_string(),
    })
    .unwrap_or(Value::Null)
}
