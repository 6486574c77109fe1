// file: src/transform/operations.rs
// description: expansion, decomposition, hypothetical answer and step-back rewrites
// reference: query rewriting for lexical retrieval

use crate::error::{RagError, Result};
use crate::generation::{GenerateOptions, Generator, Prompt, generate_text};
use tracing::{debug, warn};

pub const MAX_SUB_QUESTIONS: usize = 4;
const TRANSFORM_TEMPERATURE: f32 = 0.3;

fn expansion_prompt(query: &str) -> String {
    format!(
        "Rewrite the search query below so it matches more relevant passages in a document.\n\n\
         Query: \"{query}\"\n\n\
         - Spell out abbreviations and acronyms\n\
         - Add synonyms and closely related terms\n\
         - Keep it a single query, roughly two to three times longer\n\n\
         Reply with the rewritten query only."
    )
}

fn decomposition_prompt(query: &str) -> String {
    format!(
        "Split the question below into 2 to 4 simpler sub-questions that together answer it.\n\n\
         Question: \"{query}\"\n\n\
         Reply with a JSON array of strings only, for example: [\"first sub-question\", \"second sub-question\"]"
    )
}

fn hypothetical_prompt(query: &str) -> String {
    format!(
        "Write a plausible, factual answer to the question below as an expert would, \
         without any source document. It will be used as a search probe.\n\n\
         Question: \"{query}\"\n\n\
         Answer in 2 to 3 paragraphs."
    )
}

fn step_back_prompt(query: &str) -> String {
    format!(
        "Identify the broader topic behind the specific question below, so that foundational \
         passages can be found.\n\n\
         Question: \"{query}\"\n\n\
         Reply with a single broader search query only."
    )
}

async fn ask<G: Generator + ?Sized>(generator: &G, prompt: String) -> Result<String> {
    let options = GenerateOptions::new(TRANSFORM_TEMPERATURE);
    generate_text(generator, &Prompt::Text(prompt), &options).await
}

fn or_original<T>(operation: &str, result: Result<T>, original: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Query {} failed, using original query: {}", operation, e);
            original
        }
    }
}

/// Trims and drops one leading and one trailing quote.
fn clean_single_line(operation: &str, text: &str) -> Result<String> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix(['"', '\''])
        .unwrap_or(trimmed)
        .trim();

    if trimmed.is_empty() {
        return Err(RagError::transform(operation, "model returned empty output"));
    }
    Ok(trimmed.to_string())
}

/// First balanced `[...]` substring, ignoring brackets inside JSON strings.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

pub fn parse_sub_questions(text: &str) -> Result<Vec<String>> {
    let array = extract_json_array(text).ok_or_else(|| {
        RagError::MalformedUpstreamOutput("no JSON array in decomposition output".to_string())
    })?;

    let items: Vec<serde_json::Value> = serde_json::from_str(array).map_err(|e| {
        RagError::MalformedUpstreamOutput(format!("invalid JSON array: {}", e))
    })?;

    let mut questions = Vec::new();
    for item in items {
        let question = item.as_str().ok_or_else(|| {
            RagError::MalformedUpstreamOutput(format!("non-string sub-question: {}", item))
        })?;
        let question = question.trim();
        if !question.is_empty() {
            questions.push(question.to_string());
        }
    }
    questions.truncate(MAX_SUB_QUESTIONS);

    if questions.is_empty() {
        return Err(RagError::MalformedUpstreamOutput(
            "decomposition returned no sub-questions".to_string(),
        ));
    }
    Ok(questions)
}

pub async fn expand_query<G: Generator + ?Sized>(query: &str, generator: &G) -> String {
    let result: Result<String> = async {
        let raw = ask(generator, expansion_prompt(query)).await?;
        clean_single_line("expansion", &raw)
    }
    .await;

    let expanded = or_original("expansion", result, query.to_string());
    debug!("Expanded query to {} chars", expanded.chars().count());
    expanded
}

pub async fn decompose_query<G: Generator + ?Sized>(query: &str, generator: &G) -> Vec<String> {
    let result: Result<Vec<String>> = async {
        let raw = ask(generator, decomposition_prompt(query))
            .await
            .map_err(|e| RagError::transform("decomposition", e.to_string()))?;
        parse_sub_questions(&raw)
    }
    .await;

    let questions = or_original("decomposition", result, vec![query.to_string()]);
    debug!("Decomposed query into {} sub-question(s)", questions.len());
    questions
}

pub async fn generate_hypothetical_answer<G: Generator + ?Sized>(
    query: &str,
    generator: &G,
) -> String {
    let result: Result<String> = async {
        let raw = ask(generator, hypothetical_prompt(query)).await?;
        let answer = raw.trim();
        if answer.is_empty() {
            return Err(RagError::transform("hyde", "model returned empty output"));
        }
        Ok(answer.to_string())
    }
    .await;

    or_original("hypothetical answer", result, query.to_string())
}

pub async fn step_back_query<G: Generator + ?Sized>(query: &str, generator: &G) -> String {
    let result: Result<String> = async {
        let raw = ask(generator, step_back_prompt(query)).await?;
        clean_single_line("step-back", &raw)
    }
    .await;

    or_original("step-back", result, query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{FnGenerator, RawResponse};
    use pretty_assertions::assert_eq;

    fn replying(reply: &'static str) -> impl Generator {
        FnGenerator::new(move |_, _| async move { Ok(RawResponse::Text(reply.to_string())) })
    }

    fn failing() -> impl Generator {
        FnGenerator::new(|_, _| async { Err(RagError::Upstream("unavailable".into())) })
    }

    #[tokio::test]
    async fn test_expand_strips_quotes() {
        let expanded = expand_query("AI issues", &replying("  \"artificial intelligence problems, ML errors\"\n")).await;
        assert_eq!(expanded, "artificial intelligence problems, ML errors");
    }

    #[tokio::test]
    async fn test_expand_falls_back_on_failure_and_empty_output() {
        assert_eq!(expand_query("AI issues", &failing()).await, "AI issues");
        assert_eq!(expand_query("AI issues", &replying(" '' ")).await, "AI issues");
    }

    #[tokio::test]
    async fn test_decompose_parses_embedded_array() {
        let generator = replying("Sure! [\"What is RAG?\", \"What is fine-tuning?\"] Hope this helps.");
        let questions = decompose_query("Compare RAG vs fine-tuning", &generator).await;
        assert_eq!(questions, vec!["What is RAG?", "What is fine-tuning?"]);
    }

    #[tokio::test]
    async fn test_decompose_non_json_falls_back() {
        let questions = decompose_query("Compare A and B", &replying("I cannot do that.")).await;
        assert_eq!(questions, vec!["Compare A and B"]);
        assert_eq!(questions.len(), 1);

        let questions = decompose_query("Compare A and B", &failing()).await;
        assert_eq!(questions.len(), 1);
    }

    #[tokio::test]
    async fn test_decompose_caps_sub_questions() {
        let generator = replying("[\"a?\", \"b?\", \"c?\", \"d?\", \"e?\", \"f?\"]");
        let questions = decompose_query("many parts", &generator).await;
        assert_eq!(questions.len(), MAX_SUB_QUESTIONS);
    }

    #[test]
    fn test_parse_sub_questions_rejects_bad_arrays() {
        assert!(matches!(
            parse_sub_questions("[]"),
            Err(RagError::MalformedUpstreamOutput(_))
        ));
        assert!(matches!(
            parse_sub_questions("[1, 2]"),
            Err(RagError::MalformedUpstreamOutput(_))
        ));
        assert!(matches!(
            parse_sub_questions("[\"unterminated\""),
            Err(RagError::MalformedUpstreamOutput(_))
        ));
    }

    #[test]
    fn test_extract_json_array_is_balanced_and_quote_aware() {
        let text = "noise [\"a [b]\", \"c \\\" ]\"] trailing ] more";
        assert_eq!(extract_json_array(text), Some("[\"a [b]\", \"c \\\" ]\"]"));
        assert_eq!(extract_json_array("[[1], [2]] [3]"), Some("[[1], [2]]"));
        assert_eq!(extract_json_array("no array"), None);
        assert_eq!(extract_json_array("[ never closed"), None);
    }

    #[tokio::test]
    async fn test_hypothetical_answer() {
        let answer = generate_hypothetical_answer("What is HyDE?", &replying("HyDE generates a draft answer.\n")).await;
        assert_eq!(answer, "HyDE generates a draft answer.");
        assert_eq!(generate_hypothetical_answer("What is HyDE?", &failing()).await, "What is HyDE?");
    }

    #[tokio::test]
    async fn test_step_back() {
        let broader = step_back_query("Why is useState not updating?", &replying("'React state management'")).await;
        assert_eq!(broader, "React state management");
        assert_eq!(step_back_query("q?", &failing()).await, "q?");
    }
}
