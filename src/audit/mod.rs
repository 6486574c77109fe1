// file: src/audit/mod.rs
// description: audit trail module exports
// reference: internal module structure

pub mod logger;
pub mod store;

pub use logger::AuditLogger;
pub use store::{AuditStore, JsonlAuditStore, MemoryAuditStore};
