// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{RagError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub min_chunk_chars: usize,
    pub max_chunk_chars: usize,
    pub parallel_passes: usize,
}

/// How non-primary search queries take part in retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplementaryMode {
    /// Every search query gets its own scoring pass, merged into one ranking.
    #[default]
    Union,
    /// Sub-questions only contribute their best passage as extra prompt context.
    Context,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformConfig {
    pub expansion: Option<bool>,
    pub decomposition: Option<bool>,
    pub hyde: Option<bool>,
    pub step_back: Option<bool>,
    pub use_complexity_hints: bool,
    pub max_attempts: u32,
    pub supplementary: SupplementaryMode,
    pub max_supplementary_queries: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "openai/gpt-oss-120b".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_chunk_chars: 20,
            max_chunk_chars: 2000,
            parallel_passes: 4,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            expansion: None,
            decomposition: None,
            hyde: None,
            step_back: None,
            use_complexity_hints: false,
            max_attempts: 1,
            supplementary: SupplementaryMode::Union,
            max_supplementary_queries: 2,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 500,
            temperature: 0.3,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("data/audit.jsonl"),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RAGQUERY")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| RagError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(RagError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.min_chunk_chars >= self.retrieval.max_chunk_chars {
            return Err(RagError::Config(
                "min_chunk_chars must be smaller than max_chunk_chars".to_string(),
            ));
        }

        if self.synthesis.max_attempts == 0 || self.transform.max_attempts == 0 {
            return Err(RagError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.synthesis.temperature) {
            return Err(RagError::Config(format!(
                "temperature must be within [0, 2], got {}",
                self.synthesis.temperature
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.synthesis.max_attempts, 3);
        assert_eq!(config.synthesis.backoff_ms, 500);
        assert_eq!(config.transform.supplementary, SupplementaryMode::Union);
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = Config::default_config();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_chunk_bounds() {
        let mut config = Config::default_config();
        config.retrieval.min_chunk_chars = 500;
        config.retrieval.max_chunk_chars = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default_config();
        config.synthesis.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(
            &path,
            r#"
[retrieval]
top_k = 3

[transform]
hyde = true
supplementary = "context"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.min_chunk_chars, 20);
        assert_eq!(config.transform.hyde, Some(true));
        assert_eq!(config.transform.expansion, None);
        assert_eq!(config.transform.supplementary, SupplementaryMode::Context);
        assert_eq!(config.synthesis.max_attempts, 3);
    }
}
