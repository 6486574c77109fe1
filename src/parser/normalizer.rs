// file: src/parser/normalizer.rs
// description: text normalization applied before documents are chunked
// reference: whitespace conventions of extracted pdf/docx/web text

use crate::error::Result;

pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, content: &str) -> Result<String> {
        let mut normalized = self.normalize_line_endings(content);

        normalized = self.normalize_spaces(&normalized);
        normalized = self.normalize_trailing_whitespace(&normalized);
        normalized = self.normalize_blank_lines(&normalized);

        Ok(normalized)
    }

    fn normalize_line_endings(&self, content: &str) -> String {
        content.replace("\r\n", "\n").replace('\r', "\n")
    }

    fn normalize_spaces(&self, content: &str) -> String {
        content.replace(['\u{a0}', '\u{2007}', '\u{202f}'], " ")
    }

    // Form feeds mark page boundaries and must survive.
    fn normalize_trailing_whitespace(&self, content: &str) -> String {
        content
            .split('\n')
            .map(|line| line.trim_end_matches([' ', '\t']))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_blank_lines(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut newline_run = 0;

        for ch in content.chars() {
            if ch == '\n' {
                newline_run += 1;
                if newline_run > 2 {
                    continue;
                }
            } else {
                newline_run = 0;
            }
            result.push(ch);
        }

        result
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
