// file: src/models/document.rs
// description: core document model with content hashing and provenance hints
// reference: internal data structures

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Text,
    Url,
    Pdf,
    Docx,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Text => "text",
            SourceType::Url => "url",
            SourceType::Pdf => "pdf",
            SourceType::Docx => "docx",
        }
    }

    /// Sources whose extracted text carries form-feed page breaks.
    pub fn is_paged(&self) -> bool {
        matches!(self, SourceType::Pdf)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" | "md" | "markdown" => Ok(SourceType::Text),
            "url" => Ok(SourceType::Url),
            "pdf" => Ok(SourceType::Pdf),
            "docx" => Ok(SourceType::Docx),
            other => Err(RagError::Validation(format!(
                "Unknown source type: {}",
                other
            ))),
        }
    }
}

/// What the chunker knows about a document's layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvenanceHints {
    pub source_type: SourceType,
    pub page_count: Option<usize>,
}

impl ProvenanceHints {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            page_count: None,
        }
    }

    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = Some(page_count);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub source_type: SourceType,
    pub source_ref: String,
    pub page_count: Option<usize>,
    pub ingested_at: String,
}

impl Document {
    pub fn new(content: String, source_type: SourceType, source_ref: String) -> Self {
        let id = Self::compute_hash(&content);

        Self {
            id,
            content,
            source_type,
            source_ref,
            page_count: None,
            ingested_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(content.into(), SourceType::Text, "inline".to_string())
    }

    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = Some(page_count);
        self
    }

    pub fn hints(&self) -> ProvenanceHints {
        ProvenanceHints {
            source_type: self.source_type,
            page_count: self.page_count,
        }
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
