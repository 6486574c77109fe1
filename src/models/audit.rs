// file: src/models/audit.rs
// description: audit trail records for answered queries
// reference: compliance audit logging of retrieval provenance

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub user_id: String,
    pub query_text: String,
    pub retrieved_chunk_ids: Vec<usize>,
    pub chunks_fed_to_model: Vec<usize>,
    pub cited_chunk_ids: Vec<usize>,
    pub model_response: String,
    pub document_ids: Vec<String>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuditRecord {
    pub id: i64,
    pub created_at: String,
    #[serde(flatten)]
    pub record: AuditRecord,
}
