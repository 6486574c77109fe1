// file: src/chunker/segmenter.rs
// description: splits document text into provenance-tagged chunks
// reference: page/paragraph/sentence segmentation with character offsets

use crate::chunker::patterns::{PARAGRAPH_BREAK, SENTENCE, heading_label};
use crate::config::RetrievalConfig;
use crate::error::{RagError, Result};
use crate::models::{Chunk, ProvenanceHints};
use tracing::{debug, info};

const FORM_FEED: char = '\u{c}';

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Paragraphs must be strictly longer than this (in characters).
    pub min_chunk_chars: usize,
    /// Paragraphs longer than this are packed sentence by sentence.
    pub max_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: 20,
            max_chunk_chars: 2000,
        }
    }
}

impl From<&RetrievalConfig> for ChunkerConfig {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            min_chunk_chars: config.min_chunk_chars,
            max_chunk_chars: config.max_chunk_chars,
        }
    }
}

/// Byte range of a page (or the whole text) inside the document.
#[derive(Debug, Clone, Copy)]
struct Segment {
    page: Option<u32>,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    Paragraph,
    Sentence,
}

impl UnitKind {
    fn label(&self) -> &'static str {
        match self {
            UnitKind::Paragraph => "para",
            UnitKind::Sentence => "sent",
        }
    }
}

/// Trimmed byte range that will become one chunk.
#[derive(Debug, Clone)]
struct Unit {
    start: usize,
    end: usize,
    page: Option<u32>,
    section_id: String,
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn chunk(&self, text: &str, hints: &ProvenanceHints) -> Result<Vec<Chunk>> {
        if text.trim().is_empty() {
            return Err(RagError::EmptyDocument);
        }

        let segments = self.split_pages(text, hints);
        debug!("Split document into {} segment(s)", segments.len());

        let mut units = Vec::new();
        for segment in &segments {
            units.extend(self.segment_units(text, segment));
        }

        if units.is_empty() {
            debug!("Every paragraph was below the minimum length, splitting pages by sentence");
            for segment in &segments {
                units.extend(self.sentence_units(text, segment, segment.start, segment.end, &mut 0));
            }
        }

        if units.is_empty()
            && let Some((start, end)) = trim_span(text, 0, text.len())
        {
            let page = match segments.as_slice() {
                [only] => only.page,
                _ => None,
            };
            units.push(Unit {
                start,
                end,
                page,
                section_id: "full".to_string(),
            });
        }

        let chunks = materialize(text, units);
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument);
        }

        info!(
            "Chunked {} document into {} chunks",
            hints.source_type,
            chunks.len()
        );
        Ok(chunks)
    }

    fn split_pages(&self, text: &str, hints: &ProvenanceHints) -> Vec<Segment> {
        let paged = hints.source_type.is_paged() || text.contains(FORM_FEED);
        if !paged {
            return vec![Segment {
                page: None,
                start: 0,
                end: text.len(),
            }];
        }

        let mut ranges = Vec::new();
        let mut start = 0;
        for (position, _) in text.match_indices(FORM_FEED) {
            ranges.push((start, position));
            start = position + FORM_FEED.len_utf8();
        }
        ranges.push((start, text.len()));

        if let Some(expected) = hints.page_count
            && hints.source_type.is_paged()
            && ranges.len() < expected
        {
            debug!(
                "Found {} page break(s) for {} pages, estimating page boundaries",
                ranges.len().saturating_sub(1),
                expected
            );
            ranges = estimate_pages(text, expected);
        }

        ranges
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| Segment {
                page: Some(i as u32 + 1),
                start,
                end,
            })
            .collect()
    }

    fn segment_units(&self, text: &str, segment: &Segment) -> Vec<Unit> {
        let paragraphs = paragraph_spans(text, segment.start, segment.end);
        let mut position = 0;

        if paragraphs.len() <= 1 {
            // A lone paragraph is held to the same minimum as any other.
            let length = paragraphs
                .first()
                .map(|&(start, end)| text[start..end].chars().count())
                .unwrap_or(0);
            if length <= self.config.min_chunk_chars {
                return Vec::new();
            }
            return self.sentence_units(text, segment, segment.start, segment.end, &mut position);
        }

        let mut units = Vec::new();
        for (start, end) in paragraphs {
            let length = text[start..end].chars().count();
            if length <= self.config.min_chunk_chars {
                continue;
            }

            if length > self.config.max_chunk_chars {
                for (group_start, group_end) in self.pack_sentences(text, start, end) {
                    position += 1;
                    units.push(self.unit(text, segment, group_start, group_end, UnitKind::Paragraph, position));
                }
            } else {
                position += 1;
                units.push(self.unit(text, segment, start, end, UnitKind::Paragraph, position));
            }
        }

        units
    }

    fn sentence_units(
        &self,
        text: &str,
        segment: &Segment,
        start: usize,
        end: usize,
        position: &mut usize,
    ) -> Vec<Unit> {
        sentence_spans(text, start, end)
            .into_iter()
            .map(|(s, e)| {
                *position += 1;
                self.unit(text, segment, s, e, UnitKind::Sentence, *position)
            })
            .collect()
    }

    fn pack_sentences(&self, text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
        let mut groups = Vec::new();
        let mut current: Option<(usize, usize)> = None;

        for (s, e) in sentence_spans(text, start, end) {
            current = match current {
                Some((group_start, group_end)) => {
                    if text[group_start..e].chars().count() > self.config.max_chunk_chars {
                        groups.push((group_start, group_end));
                        Some((s, e))
                    } else {
                        Some((group_start, e))
                    }
                }
                None => Some((s, e)),
            };
        }

        if let Some(group) = current {
            groups.push(group);
        }
        groups
    }

    fn unit(
        &self,
        text: &str,
        segment: &Segment,
        start: usize,
        end: usize,
        kind: UnitKind,
        position: usize,
    ) -> Unit {
        Unit {
            start,
            end,
            page: segment.page,
            section_id: section_id(&text[start..end], segment.page, kind, position),
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

fn section_id(unit_text: &str, page: Option<u32>, kind: UnitKind, position: usize) -> String {
    let local = heading_label(unit_text)
        .unwrap_or_else(|| format!("{}{}", kind.label(), position));

    match page {
        Some(page) => format!("page{}_{}", page, local),
        None => local,
    }
}

fn trim_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let leading = slice.len() - slice.trim_start().len();
    Some((start + leading, start + leading + trimmed.len()))
}

fn paragraph_spans(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let body = &text[start..end];
    let mut spans = Vec::new();
    let mut last = 0;

    for separator in PARAGRAPH_BREAK.find_iter(body) {
        spans.extend(trim_span(text, start + last, start + separator.start()));
        last = separator.end();
    }
    spans.extend(trim_span(text, start + last, end));
    spans
}

fn sentence_spans(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    SENTENCE
        .find_iter(&text[start..end])
        .filter_map(|m| trim_span(text, start + m.start(), start + m.end()))
        .collect()
}

/// Equal character-count slices, for page-bearing text that lost its page breaks.
fn estimate_pages(text: &str, pages: usize) -> Vec<(usize, usize)> {
    let total_chars = text.chars().count();
    let per_page = total_chars.div_ceil(pages.max(1)).max(1);

    let mut boundaries: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .step_by(per_page)
        .collect();
    boundaries.push(text.len());

    boundaries.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Converts monotonically increasing byte offsets to character offsets.
struct CharOffsets<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharOffsets<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn at(&mut self, byte: usize) -> usize {
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

fn materialize(text: &str, units: Vec<Unit>) -> Vec<Chunk> {
    let mut offsets = CharOffsets::new(text);

    units
        .into_iter()
        .enumerate()
        .map(|(index, unit)| Chunk {
            index,
            text: text[unit.start..unit.end].to_string(),
            page_number: unit.page,
            section_id: Some(unit.section_id),
            start_char: offsets.at(unit.start),
            end_char: offsets.at(unit.end),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use pretty_assertions::assert_eq;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    fn assert_well_formed(content: &str, chunks: &[Chunk]) {
        assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.end_char > chunk.start_char);
            let slice: String = content
                .chars()
                .skip(chunk.start_char)
                .take(chunk.end_char - chunk.start_char)
                .collect();
            assert_eq!(slice, chunk.text);
        }
    }

    #[test]
    fn test_sentence_fallback_without_blank_lines() {
        let content = "A cat sat. A dog ran. A cat and dog played.";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::default())
            .unwrap();

        assert_eq!(
            texts(&chunks),
            vec!["A cat sat.", "A dog ran.", "A cat and dog played."]
        );
        assert_eq!(chunks[1].section_id.as_deref(), Some("sent2"));
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_short_paragraphs_are_filtered() {
        let content = "Title\n\nThis is a sufficiently long first paragraph.\n\n  \n\nAnd here is another long paragraph.";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::default())
            .unwrap();

        assert_eq!(
            texts(&chunks),
            vec![
                "This is a sufficiently long first paragraph.",
                "And here is another long paragraph."
            ]
        );
        assert_eq!(chunks[0].section_id.as_deref(), Some("para1"));
        assert_eq!(chunks[1].section_id.as_deref(), Some("para2"));
        assert_eq!(chunks[0].page_number, None);
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_all_short_paragraphs_fall_back_to_sentences() {
        let content = "Hi there.\n\nYo.\n\nOk then!";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::default())
            .unwrap();

        assert_eq!(texts(&chunks), vec!["Hi there.", "Yo.", "Ok then!"]);
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_paged_source_with_headings() {
        let content = "Page one paragraph that is long enough.\n\nSecond paragraph on page one, also long.\u{c}Article 5 Termination clause text here.\n\nAnother paragraph on page two here.";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::new(SourceType::Pdf))
            .unwrap();

        let pages: Vec<Option<u32>> = chunks.iter().map(|c| c.page_number).collect();
        assert_eq!(pages, vec![Some(1), Some(1), Some(2), Some(2)]);

        let sections: Vec<&str> = chunks
            .iter()
            .map(|c| c.section_id.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(
            sections,
            vec!["page1_para1", "page1_para2", "page2_Article_5", "page2_para2"]
        );
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_page_number_only_page_is_dropped() {
        let content = "First paragraph is definitely long enough.\n\nSecond paragraph is also long enough here.\u{c}12";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::new(SourceType::Pdf))
            .unwrap();

        assert_eq!(
            texts(&chunks),
            vec![
                "First paragraph is definitely long enough.",
                "Second paragraph is also long enough here."
            ]
        );
        assert!(chunks.iter().all(|c| c.page_number == Some(1)));
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_short_single_line_page_is_dropped() {
        let content = "Annual Report\u{c}The company grew revenue in every region this year. Costs fell.";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::new(SourceType::Pdf))
            .unwrap();

        assert_eq!(
            texts(&chunks),
            vec![
                "The company grew revenue in every region this year.",
                "Costs fell."
            ]
        );
        assert_eq!(chunks[0].section_id.as_deref(), Some("page2_sent1"));
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_sentence_fallback_keeps_page_numbers() {
        let content = "Hi there.\n\nYo.\u{c}Ok then.\n\nNo.";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::new(SourceType::Pdf))
            .unwrap();

        assert_eq!(texts(&chunks), vec!["Hi there.", "Yo.", "Ok then.", "No."]);
        let pages: Vec<Option<u32>> = chunks.iter().map(|c| c.page_number).collect();
        assert_eq!(pages, vec![Some(1), Some(1), Some(2), Some(2)]);
        let sections: Vec<&str> = chunks
            .iter()
            .map(|c| c.section_id.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(
            sections,
            vec!["page1_sent1", "page1_sent2", "page2_sent1", "page2_sent2"]
        );
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_page_estimation_without_form_feeds() {
        let content = "First half sentence goes here. Second half sentence goes here.";
        let hints = ProvenanceHints::new(SourceType::Pdf).with_page_count(2);
        let chunks = Chunker::default().chunk(content, &hints).unwrap();

        assert_eq!(chunks.first().and_then(|c| c.page_number), Some(1));
        assert_eq!(chunks.last().and_then(|c| c.page_number), Some(2));
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_numeric_outline_section_id() {
        let content = "4.3 Scope of the services provided.\n\nThe contractor shall deliver monthly.";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::default())
            .unwrap();
        assert_eq!(chunks[0].section_id.as_deref(), Some("4.3"));
        assert_eq!(chunks[1].section_id.as_deref(), Some("para2"));
    }

    #[test]
    fn test_oversized_paragraph_is_packed() {
        let chunker = Chunker::new(ChunkerConfig {
            min_chunk_chars: 5,
            max_chunk_chars: 40,
        });
        let content = "Short intro paragraph.\n\nOne sentence here. Two sentence here. Three sentence here.";
        let chunks = chunker
            .chunk(content, &ProvenanceHints::default())
            .unwrap();

        assert_eq!(
            texts(&chunks),
            vec![
                "Short intro paragraph.",
                "One sentence here. Two sentence here.",
                "Three sentence here."
            ]
        );
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_empty_document_error() {
        let result = Chunker::default().chunk(" \n\t\n ", &ProvenanceHints::default());
        assert!(matches!(result, Err(RagError::EmptyDocument)));
    }

    #[test]
    fn test_punctuation_only_still_chunks() {
        let chunks = Chunker::default()
            .chunk("  ???  ", &ProvenanceHints::default())
            .unwrap();
        assert_eq!(texts(&chunks), vec!["???"]);
        assert_eq!(chunks[0].start_char, 2);
        assert_eq!(chunks[0].end_char, 5);
    }

    #[test]
    fn test_multibyte_offsets() {
        let content = "Über die Größe der Straße wird berichtet.\n\nZweiter Absatz mit genügend Länge hier.";
        let chunks = Chunker::default()
            .chunk(content, &ProvenanceHints::default())
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_well_formed(content, &chunks);
    }

    #[test]
    fn test_well_formed_for_varied_inputs() {
        let inputs = [
            "x",
            "single line without punctuation",
            "a.\n\nb.\n\nc.",
            "Line one of a paragraph\nline two of the same paragraph.\n\nAnother paragraph that is long.",
            "\u{c}\u{c}Only the third page has text in it.",
        ];
        for input in inputs {
            let chunks = Chunker::default()
                .chunk(input, &ProvenanceHints::default())
                .unwrap();
            assert_well_formed(input, &chunks);
        }
    }
}
