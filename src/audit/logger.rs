// file: src/audit/logger.rs
// description: audit logging that never interrupts the answer path
// reference: failures are logged and swallowed

use crate::audit::store::{AuditStore, JsonlAuditStore};
use crate::config::AuditConfig;
use crate::error::Result;
use crate::models::{AuditRecord, StoredAuditRecord};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct AuditLogger {
    store: Option<Arc<dyn AuditStore>>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub async fn from_config(config: &AuditConfig) -> Result<Self> {
        if !config.enabled {
            debug!("Audit logging disabled");
            return Ok(Self::disabled());
        }
        let store = JsonlAuditStore::open(config.path.clone()).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Like [`Self::from_config`], but an unopenable store yields a disabled logger.
    pub async fn from_config_or_disabled(config: &AuditConfig) -> Self {
        match Self::from_config(config).await {
            Ok(logger) => logger,
            Err(e) => {
                error!(
                    "Audit log {} unavailable, continuing without auditing: {}",
                    config.path.display(),
                    e
                );
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn log(&self, record: &AuditRecord) -> Option<i64> {
        let store = self.store.as_ref()?;
        match store.insert(record).await {
            Ok(id) => {
                info!("Logged audit record {}", id);
                Some(id)
            }
            Err(e) => {
                error!("Failed to log audit record: {}", e);
                None
            }
        }
    }

    pub async fn recent(&self, user_id: &str, limit: usize) -> Vec<StoredAuditRecord> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        store.query(user_id, limit).await.unwrap_or_else(|e| {
            error!("Failed to read audit records: {}", e);
            Vec::new()
        })
    }

    pub async fn find(&self, id: i64) -> Option<StoredAuditRecord> {
        let store = self.store.as_ref()?;
        store.get(id).await.unwrap_or_else(|e| {
            error!("Failed to read audit record {}: {}", id, e);
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::store::MemoryAuditStore;
    use crate::error::RagError;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl AuditStore for BrokenStore {
        async fn insert(&self, _record: &AuditRecord) -> Result<i64> {
            Err(RagError::Audit("connection refused".into()))
        }

        async fn query(&self, _user_id: &str, _limit: usize) -> Result<Vec<StoredAuditRecord>> {
            Err(RagError::Audit("connection refused".into()))
        }

        async fn get(&self, _id: i64) -> Result<Option<StoredAuditRecord>> {
            Err(RagError::Audit("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let logger = AuditLogger::new(Arc::new(BrokenStore));
        assert_eq!(logger.log(&AuditRecord::default()).await, None);
        assert!(logger.recent("anyone", 10).await.is_empty());
        assert!(logger.find(1).await.is_none());
    }

    #[tokio::test]
    async fn test_logs_to_store() {
        let store = Arc::new(MemoryAuditStore::new());
        let logger = AuditLogger::new(store.clone());

        let record = AuditRecord {
            user_id: "u1".to_string(),
            ..AuditRecord::default()
        };
        assert_eq!(logger.log(&record).await, Some(1));
        assert_eq!(logger.recent("u1", 5).await.len(), 1);
        assert_eq!(logger.find(1).await.unwrap().record.user_id, "u1");
    }

    #[tokio::test]
    async fn test_unopenable_store_disables_logging() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data"), "not a directory").unwrap();
        let blocked = AuditConfig {
            enabled: true,
            path: dir.path().join("data").join("audit.jsonl"),
        };
        assert!(AuditLogger::from_config(&blocked).await.is_err());
        let logger = AuditLogger::from_config_or_disabled(&blocked).await;
        assert!(!logger.is_enabled());
        assert_eq!(logger.log(&AuditRecord::default()).await, None);

        let binary = dir.path().join("binary.jsonl");
        std::fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        let unreadable = AuditConfig {
            enabled: true,
            path: binary,
        };
        assert!(!AuditLogger::from_config_or_disabled(&unreadable).await.is_enabled());
    }

    #[tokio::test]
    async fn test_openable_store_stays_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditConfig {
            enabled: true,
            path: dir.path().join("logs").join("audit.jsonl"),
        };
        let logger = AuditLogger::from_config_or_disabled(&config).await;
        assert!(logger.is_enabled());
        assert_eq!(logger.log(&AuditRecord::default()).await, Some(1));
    }

    #[tokio::test]
    async fn test_disabled_logger() {
        let config = AuditConfig {
            enabled: false,
            ..AuditConfig::default()
        };
        let logger = AuditLogger::from_config(&config).await.unwrap();
        assert!(!logger.is_enabled());
        assert_eq!(logger.log(&AuditRecord::default()).await, None);
    }
}
