// file: src/parser/loader.rs
// description: reads pre-extracted document text from disk into a Document
// reference: ingestion of file, url and pasted sources

use crate::error::{RagError, Result};
use crate::models::{Document, SourceType};
use crate::parser::{MarkdownParser, TextNormalizer};
use crate::utils::Validator;
use std::path::Path;
use tracing::{debug, info};

pub struct DocumentLoader {
    normalizer: TextNormalizer,
    markdown: MarkdownParser,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            markdown: MarkdownParser::new(),
        }
    }

    pub fn load(&self, path: &Path, source_type: SourceType) -> Result<Document> {
        Validator::validate_file_path(path)?;
        Validator::validate_text_extension(path)?;

        let raw = std::fs::read_to_string(path).map_err(|source| RagError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

        let content = if Validator::is_markdown(path) {
            debug!("Converting markdown to plain text: {}", path.display());
            self.markdown.parse(&raw)?.plain_text
        } else {
            raw
        };

        let document = self.from_content(&content, source_type, path.display().to_string())?;
        info!(
            "Loaded {} document {} ({} chars)",
            source_type,
            path.display(),
            document.content.chars().count()
        );
        Ok(document)
    }

    /// Pasted text and scraped page content enter here.
    pub fn from_content(
        &self,
        content: &str,
        source_type: SourceType,
        source_ref: String,
    ) -> Result<Document> {
        Validator::validate_content_not_empty(content)?;
        let normalized = self.normalizer.normalize(content)?;

        let mut document = Document::new(normalized, source_type, source_ref);
        if source_type.is_paged() {
            let pages = document.content.matches('\u{c}').count() + 1;
            document = document.with_page_count(pages);
        }
        Ok(document)
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}
