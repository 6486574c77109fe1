// file: src/exporter/json.rs
// description: json export of batch answers with a manifest

use crate::error::{RagError, Result};
use crate::pipeline::{BatchAnswer, BatchStats};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    pretty: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub document_id: String,
    pub total_answers: usize,
    pub degraded: usize,
    pub failed: usize,
    pub files: Vec<String>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>, pretty: bool) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| RagError::FileOperation {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir, pretty })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        let contents = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        let path = self.output_dir.join(file_name);
        fs::write(&path, contents).map_err(|source| RagError::FileOperation {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    pub fn export_batch(
        &self,
        document_id: &str,
        answers: &[BatchAnswer],
        stats: &BatchStats,
    ) -> Result<ExportManifest> {
        info!("Exporting {} answers to {}", answers.len(), self.output_dir.display());

        let mut files = Vec::with_capacity(answers.len());
        for answer in answers {
            let file_name = format!("answer_{:03}.json", answer.number);
            self.write_json(&file_name, answer)?;
            files.push(file_name);
        }

        let manifest = ExportManifest {
            exported_at: Utc::now().to_rfc3339(),
            document_id: document_id.to_string(),
            total_answers: stats.answered,
            degraded: stats.degraded,
            failed: stats.failed,
            files,
        };
        self.write_json(MANIFEST_FILE, &manifest)?;

        info!("Export complete: {} files", manifest.files.len());
        Ok(manifest)
    }
}
