// file: src/models/query.rs
// description: search queries produced by query transformation
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOrigin {
    Original,
    Expanded,
    Subquestion,
    Hyde,
    Stepback,
}

impl QueryOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOrigin::Original => "original",
            QueryOrigin::Expanded => "expanded",
            QueryOrigin::Subquestion => "subquestion",
            QueryOrigin::Hyde => "hyde",
            QueryOrigin::Stepback => "stepback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub origin: QueryOrigin,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, origin: QueryOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    pub fn original(text: impl Into<String>) -> Self {
        Self::new(text, QueryOrigin::Original)
    }
}
