// file: src/transform/mod.rs
// description: query transformer composing expansion, decomposition, HyDE and step-back
// reference: internal module structure

pub mod complexity;
pub mod operations;

pub use complexity::{ComplexityReport, SuggestedTransforms, analyze_complexity};
pub use operations::{
    decompose_query, expand_query, extract_json_array, generate_hypothetical_answer,
    step_back_query,
};

use crate::config::TransformConfig;
use crate::generation::Generator;
use crate::models::{QueryOrigin, SearchQuery};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Caller flags; `None` leaves the decision to complexity hints or defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOverrides {
    pub expansion: Option<bool>,
    pub decomposition: Option<bool>,
    pub hyde: Option<bool>,
    pub step_back: Option<bool>,
}

impl From<&TransformConfig> for TransformOverrides {
    fn from(config: &TransformConfig) -> Self {
        Self {
            expansion: config.expansion,
            decomposition: config.decomposition,
            hyde: config.hyde,
            step_back: config.step_back,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransformOptions {
    pub expansion: bool,
    pub decomposition: bool,
    pub hyde: bool,
    pub step_back: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            expansion: true,
            decomposition: false,
            hyde: false,
            step_back: false,
        }
    }
}

impl TransformOptions {
    pub fn none() -> Self {
        Self {
            expansion: false,
            decomposition: false,
            hyde: false,
            step_back: false,
        }
    }

    /// Explicit flags win; hints only fill flags left unset.
    pub fn resolve(overrides: &TransformOverrides, report: Option<&ComplexityReport>) -> Self {
        let defaults = Self::default();
        let hints = report.map(|r| r.suggested_transforms);

        Self {
            expansion: overrides
                .expansion
                .or(hints.map(|h| h.expansion))
                .unwrap_or(defaults.expansion),
            decomposition: overrides
                .decomposition
                .or(hints.map(|h| h.decomposition))
                .unwrap_or(defaults.decomposition),
            hyde: overrides
                .hyde
                .or(hints.map(|h| h.hyde))
                .unwrap_or(defaults.hyde),
            step_back: overrides
                .step_back
                .or(hints.map(|h| h.step_back))
                .unwrap_or(defaults.step_back),
        }
    }

    pub fn any(&self) -> bool {
        self.expansion || self.decomposition || self.hyde || self.step_back
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedQuery {
    pub original_query: String,
    pub expanded_query: Option<String>,
    pub sub_questions: Option<Vec<String>>,
    pub hypothetical_answer: Option<String>,
    pub step_back_query: Option<String>,
    /// Original first; duplicates by text removed.
    pub search_queries: Vec<SearchQuery>,
}

impl TransformedQuery {
    pub fn untransformed(query: &str) -> Self {
        Self {
            original_query: query.to_string(),
            expanded_query: None,
            sub_questions: None,
            hypothetical_answer: None,
            step_back_query: None,
            search_queries: vec![SearchQuery::original(query)],
        }
    }

    /// Queries that are not sub-questions.
    pub fn primary_queries(&self) -> Vec<SearchQuery> {
        self.search_queries
            .iter()
            .filter(|q| q.origin != QueryOrigin::Subquestion)
            .cloned()
            .collect()
    }

    pub fn sub_question_queries(&self) -> Vec<SearchQuery> {
        self.search_queries
            .iter()
            .filter(|q| q.origin == QueryOrigin::Subquestion)
            .cloned()
            .collect()
    }
}

pub async fn transform<G: Generator + ?Sized>(
    query: &str,
    generator: &G,
    options: &TransformOptions,
) -> TransformedQuery {
    let mut result = TransformedQuery::untransformed(query);

    if options.expansion {
        let expanded = expand_query(query, generator).await;
        result
            .search_queries
            .push(SearchQuery::new(expanded.clone(), QueryOrigin::Expanded));
        result.expanded_query = Some(expanded);
    }

    if options.decomposition {
        let questions = decompose_query(query, generator).await;
        result.search_queries.extend(
            questions
                .iter()
                .map(|q| SearchQuery::new(q.clone(), QueryOrigin::Subquestion)),
        );
        result.sub_questions = Some(questions);
    }

    if options.hyde {
        let hypothetical = generate_hypothetical_answer(query, generator).await;
        result
            .search_queries
            .push(SearchQuery::new(hypothetical.clone(), QueryOrigin::Hyde));
        result.hypothetical_answer = Some(hypothetical);
    }

    if options.step_back {
        let broader = step_back_query(query, generator).await;
        result
            .search_queries
            .push(SearchQuery::new(broader.clone(), QueryOrigin::Stepback));
        result.step_back_query = Some(broader);
    }

    let mut seen = HashSet::new();
    result
        .search_queries
        .retain(|q| seen.insert(q.text.clone()));

    info!(
        "Transformed query into {} search queries",
        result.search_queries.len()
    );
    result
}
