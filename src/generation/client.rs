// file: src/generation/client.rs
// description: OpenAI-compatible chat completions client (Groq by default)
// reference: https://console.groq.com/docs/api-reference#chat-create

use crate::config::GenerationConfig;
use crate::error::{RagError, Result};
use crate::generation::{GenerateOptions, Generator, Prompt, RawResponse, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize, PartialEq)]
struct CompletionMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    temperature: f32,
}

pub struct OpenAiCompatClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RagError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &Prompt, options: &GenerateOptions) -> CompletionRequest {
        let mut messages = Vec::new();

        if let Some(instruction) = &options.system_instruction {
            messages.push(CompletionMessage {
                role: "system",
                content: instruction.clone(),
            });
        }

        match prompt {
            Prompt::Text(text) => messages.push(CompletionMessage {
                role: "user",
                content: text.clone(),
            }),
            Prompt::Messages(history) => {
                messages.extend(history.iter().map(|message| CompletionMessage {
                    role: match message.role {
                        Role::User => "user",
                        Role::Model => "assistant",
                    },
                    content: message.content.clone(),
                }));
            }
        }

        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: options.temperature,
        }
    }
}

#[async_trait]
impl Generator for OpenAiCompatClient {
    async fn generate(&self, prompt: &Prompt, options: &GenerateOptions) -> Result<RawResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(prompt, options);

        debug!(
            "Requesting completion from {} for {} prompt chars",
            self.model,
            prompt.char_len()
        );

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RagError::Timeout(self.timeout)
            } else {
                RagError::Upstream(format!("Failed to send completion request: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagError::Upstream(format!(
                "Completion request failed with status {}: {}",
                status, error_text
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            RagError::Upstream(format!("Failed to parse completion response: {}", e))
        })?;

        Ok(RawResponse::Structured(body))
    }
}
