// file: src/api/mod.rs
// description: action contract module exports
// reference: internal module structure

pub mod action;

pub use action::{
    ActionHandler, ActionRequest, ActionResponse, ChatPayload, ChatResponse, ChatTurn, ErrorBody,
    RagPayload, RagResponse, RankedChunkView, ScrapePayload, ScrapeResponse,
};

/// JSON Schemas for the request and response contract.
pub fn contract_schemas() -> serde_json::Value {
    serde_json::json!({
        "request": schemars::schema_for!(ActionRequest),
        "response": schemars::schema_for!(ActionResponse),
        "error": schemars::schema_for!(ErrorBody),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_schemas_are_objects() {
        let schemas = contract_schemas();
        assert!(schemas["request"].is_object());
        assert!(schemas["response"].is_object());
        assert!(schemas["error"].is_object());
    }
}
