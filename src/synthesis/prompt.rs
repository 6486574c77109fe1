// file: src/synthesis/prompt.rs
// description: grounding prompt and extractive fallback text
// reference: passage-grounded answer prompting

use crate::models::{RankedResult, ScoredChunk};

pub const NO_ANSWER: &str = "No answer generated";

/// Heading line plus text for one passage, `i` being 1-based.
pub fn format_passage(i: usize, passage: &ScoredChunk) -> String {
    let mut heading = format!("### [Source {}]", i);
    if let Some(page) = passage.page_number {
        heading.push_str(&format!(" (Page {})", page));
    }
    if let Some(section) = &passage.section_id {
        heading.push_str(&format!(" §{}", section));
    }
    heading.push_str(&format!(" - Relevance: {}%", passage.score));

    format!("{}\n{}", heading, passage.text)
}

pub fn build_prompt(query: &str, ranked: &RankedResult, additional: &[ScoredChunk]) -> String {
    let passages = ranked
        .iter()
        .enumerate()
        .map(|(i, passage)| format_passage(i + 1, passage))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut prompt = String::from(
        "You are a careful assistant. Answer the user's question using ONLY the passages below. \
         If the passages do not contain the answer, say so instead of guessing.\n\n\
         Structure the answer as:\n\
         - A short summary\n\
         - Bulleted key points, each with one or two sentences of explanation\n\
         - A brief conclusion\n\n\
         Cite passages inline as [Source X] or [Source X, p.Y].\n\n\
         RELEVANT PASSAGES:\n\n",
    );
    prompt.push_str(&passages);

    if !additional.is_empty() {
        let context = additional
            .iter()
            .map(|passage| passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        prompt.push_str("\n\nADDITIONAL CONTEXT:\n\n");
        prompt.push_str(&context);
    }

    prompt.push_str(&format!("\n\nUSER QUESTION: \"{}\"\n\nAnswer:", query));
    prompt
}

pub fn degraded_answer(ranked: &RankedResult) -> String {
    let top = ranked.top().map(|c| c.text.as_str()).unwrap_or("N/A");
    format!(
        "Found {} relevant passages. Top passage: \"{}\"",
        ranked.len(),
        top
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use crate::retrieval::rank;

    fn passage(index: usize, page: Option<u32>, section: Option<&str>, score: u8) -> ScoredChunk {
        ScoredChunk::new(
            Chunk {
                index,
                text: format!("passage {}", index),
                page_number: page,
                section_id: section.map(str::to_string),
                start_char: 0,
                end_char: 9,
            },
            score,
        )
    }

    #[test]
    fn test_format_passage_with_provenance() {
        let line = format_passage(1, &passage(3, Some(2), Some("page2_para1"), 40));
        assert_eq!(line, "### [Source 1] (Page 2) §page2_para1 - Relevance: 40%\npassage 3");

        let bare = format_passage(2, &passage(0, None, None, 7));
        assert_eq!(bare, "### [Source 2] - Relevance: 7%\npassage 0");
    }

    #[test]
    fn test_build_prompt_orders_passages() {
        let ranked = rank(vec![passage(0, None, None, 10), passage(1, None, None, 90)], 5);
        let prompt = build_prompt("what?", &ranked, &[]);

        let first = prompt.find("passage 1").unwrap();
        let second = prompt.find("passage 0").unwrap();
        assert!(first < second);
        assert!(prompt.contains("USER QUESTION: \"what?\""));
        assert!(!prompt.contains("ADDITIONAL CONTEXT"));
    }

    #[test]
    fn test_build_prompt_with_additional_context() {
        let ranked = rank(vec![passage(0, None, None, 10)], 5);
        let prompt = build_prompt("q", &ranked, &[passage(8, None, None, 50)]);
        assert!(prompt.contains("ADDITIONAL CONTEXT:\n\npassage 8"));
    }

    #[test]
    fn test_degraded_answer() {
        let ranked = rank(vec![passage(0, None, None, 10), passage(1, None, None, 30)], 5);
        assert_eq!(
            degraded_answer(&ranked),
            "Found 2 relevant passages. Top passage: \"passage 1\""
        );
        assert_eq!(
            degraded_answer(&RankedResult::default()),
            "Found 0 relevant passages. Top passage: \"N/A\""
        );
    }
}
