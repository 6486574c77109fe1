// file: src/parser/markdown.rs
// description: markdown to plain text conversion preserving paragraph boundaries
// reference: https://docs.rs/pulldown-cmark

use crate::error::Result;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

pub struct MarkdownParser;

#[derive(Debug, Clone)]
pub struct ParsedMarkdown {
    /// Block elements separated by blank lines
    pub plain_text: String,
    pub headings: Vec<Heading>,
}

#[derive(Debug, Clone)]
pub struct Heading {
    pub level: u32,
    pub text: String,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str) -> Result<ParsedMarkdown> {
        let parser = Parser::new(content);

        let mut blocks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut headings = Vec::new();
        let mut current_heading: Option<(u32, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    flush_block(&mut blocks, &mut current);
                    current_heading = Some((level as u32, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = current_heading.take() {
                        headings.push(Heading {
                            level,
                            text: text.trim().to_string(),
                        });
                    }
                    flush_block(&mut blocks, &mut current);
                }
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Item)
                | Event::End(TagEnd::CodeBlock) => {
                    flush_block(&mut blocks, &mut current);
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, ref mut heading_text)) = current_heading {
                        heading_text.push_str(&text);
                    }
                    current.push_str(&text);
                }
                Event::SoftBreak => current.push(' '),
                Event::HardBreak => current.push('\n'),
                _ => {}
            }
        }

        flush_block(&mut blocks, &mut current);

        Ok(ParsedMarkdown {
            plain_text: blocks.join("\n\n"),
            headings,
        })
    }
}

fn flush_block(blocks: &mut Vec<String>, current: &mut String) {
    let block = current.trim();
    if !block.is_empty() {
        blocks.push(block.to_string());
    }
    current.clear();
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}
