// file: src/models/citation.rs
// description: citation references recovered from synthesized answers
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based source number as written in the answer
    pub doc_ref: u32,
    pub page_number: Option<u32>,
    pub section_id: Option<String>,
    /// The literal bracketed text
    pub matched_text: String,
    /// Character offset of the match start
    pub position: usize,
}
