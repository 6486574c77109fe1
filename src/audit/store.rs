// file: src/audit/store.rs
// description: audit persistence collaborator with JSON-lines and in-memory stores
// reference: append-only audit trail storage

use crate::error::{RagError, Result};
use crate::models::{AuditRecord, StoredAuditRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Returns the id of the stored record.
    async fn insert(&self, record: &AuditRecord) -> Result<i64>;

    /// Newest first.
    async fn query(&self, user_id: &str, limit: usize) -> Result<Vec<StoredAuditRecord>>;

    async fn get(&self, id: i64) -> Result<Option<StoredAuditRecord>>;
}

fn stamp(id: i64, record: &AuditRecord) -> StoredAuditRecord {
    StoredAuditRecord {
        id,
        created_at: Utc::now().to_rfc3339(),
        record: record.clone(),
    }
}

fn newest_for_user(
    records: impl Iterator<Item = StoredAuditRecord>,
    user_id: &str,
    limit: usize,
) -> Vec<StoredAuditRecord> {
    let mut matching: Vec<StoredAuditRecord> =
        records.filter(|r| r.record.user_id == user_id).collect();
    matching.sort_by(|a, b| b.id.cmp(&a.id));
    matching.truncate(limit);
    matching
}

/// One JSON object per line; ids are sequential.
pub struct JsonlAuditStore {
    path: PathBuf,
    next_id: Mutex<i64>,
}

impl JsonlAuditStore {
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                RagError::Audit(format!("Failed to create audit directory: {}", e))
            })?;
        }

        let existing = read_records(&path).await?;
        let next_id = existing.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        info!(
            "Opened audit log {} with {} records",
            path.display(),
            existing.len()
        );

        Ok(Self {
            path,
            next_id: Mutex::new(next_id),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_records(path: &Path) -> Result<Vec<StoredAuditRecord>> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!("No existing audit log found at {}", path.display());
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| RagError::Audit(format!("Failed to read audit log: {}", e)))?;

    let mut records = Vec::new();
    for (line_number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredAuditRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                "Skipping malformed audit line {} in {}: {}",
                line_number + 1,
                path.display(),
                e
            ),
        }
    }
    Ok(records)
}

#[async_trait]
impl AuditStore for JsonlAuditStore {
    async fn insert(&self, record: &AuditRecord) -> Result<i64> {
        let mut next_id = self.next_id.lock().await;
        let stored = stamp(*next_id, record);

        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RagError::Audit(format!("Failed to open audit log: {}", e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| RagError::Audit(format!("Failed to append audit record: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| RagError::Audit(format!("Failed to flush audit log: {}", e)))?;

        *next_id += 1;
        Ok(stored.id)
    }

    async fn query(&self, user_id: &str, limit: usize) -> Result<Vec<StoredAuditRecord>> {
        let records = read_records(&self.path).await?;
        Ok(newest_for_user(records.into_iter(), user_id, limit))
    }

    async fn get(&self, id: i64) -> Result<Option<StoredAuditRecord>> {
        let records = read_records(&self.path).await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }
}

#[derive(Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<StoredAuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert(&self, record: &AuditRecord) -> Result<i64> {
        let mut records = self.records.lock().await;
        let id = records.len() as i64 + 1;
        records.push(stamp(id, record));
        Ok(id)
    }

    async fn query(&self, user_id: &str, limit: usize) -> Result<Vec<StoredAuditRecord>> {
        let records = self.records.lock().await;
        Ok(newest_for_user(records.iter().cloned(), user_id, limit))
    }

    async fn get(&self, id: i64) -> Result<Option<StoredAuditRecord>> {
        let records = self.records.lock().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}
