// file: src/generation/mod.rs
// description: text-generation collaborator trait, prompt types and closure adapter
// reference: https://docs.rs/async-trait

pub mod client;
pub mod response;
pub mod retry;

pub use client::OpenAiCompatClient;
pub use response::{RawResponse, TextAccessor};
pub use retry::{RetryPolicy, Retrying, generate_with_retry};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Prompt::Text(text.into())
    }

    pub fn char_len(&self) -> usize {
        match self {
            Prompt::Text(text) => text.chars().count(),
            Prompt::Messages(messages) => messages.iter().map(|m| m.content.chars().count()).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub system_instruction: Option<String>,
}

impl GenerateOptions {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            system_instruction: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::new(0.3)
    }
}

/// The external model. A single call may fail transiently; callers own retries.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt, options: &GenerateOptions) -> Result<RawResponse>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Arc<G> {
    async fn generate(&self, prompt: &Prompt, options: &GenerateOptions) -> Result<RawResponse> {
        (**self).generate(prompt, options).await
    }
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Box<G> {
    async fn generate(&self, prompt: &Prompt, options: &GenerateOptions) -> Result<RawResponse> {
        (**self).generate(prompt, options).await
    }
}

/// Generates and normalizes the response to plain text.
pub async fn generate_text<G: Generator + ?Sized>(
    generator: &G,
    prompt: &Prompt,
    options: &GenerateOptions,
) -> Result<String> {
    Ok(generator.generate(prompt, options).await?.into_text())
}

/// Adapts an async closure into a [`Generator`].
pub struct FnGenerator<F> {
    f: F,
}

impl<F, Fut> FnGenerator<F>
where
    F: Fn(Prompt, GenerateOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse>> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Generator for FnGenerator<F>
where
    F: Fn(Prompt, GenerateOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse>> + Send,
{
    async fn generate(&self, prompt: &Prompt, options: &GenerateOptions) -> Result<RawResponse> {
        (self.f)(prompt.clone(), options.clone()).await
    }
}
