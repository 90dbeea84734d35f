//! Configuration management for study-ingest
//!
//! Handles chunking policy, embedding backend selection and persistence of
//! user preferences in `~/.study-ingest/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chunking::{ChunkPolicy, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::error::IngestError;
use crate::summary::DEFAULT_SUMMARY_CHARS;

/// Device preference for compute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum DevicePreference {
    /// Automatically detect best available device (GPU if available, else CPU)
    #[default]
    Auto,
    /// Force CPU usage
    Cpu,
    /// Force Metal GPU (macOS Apple Silicon)
    Metal,
    /// Force CUDA GPU (NVIDIA)
    Cuda,
}

impl DevicePreference {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Metal => "metal",
            Self::Cuda => "cuda",
        }
    }
}

/// Local embedding models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum EmbeddingModel {
    /// BGE Base - balanced quality and size
    BgeBaseEnV15,
    /// BGE Small - faster, smaller footprint
    BgeSmallEnV15,
    /// all-MiniLM-L6-v2 - 6 layers, smallest/fastest
    AllMiniLmL6V2,
    /// all-MiniLM-L12-v2 - 12 layers, better quality than L6 (default)
    #[default]
    AllMiniLmL12V2,
}

impl EmbeddingModel {
    /// Display name for the model
    pub fn name(&self) -> &'static str {
        match self {
            Self::BgeBaseEnV15 => "bge-base-en-v1.5",
            Self::BgeSmallEnV15 => "bge-small-en-v1.5",
            Self::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "all-MiniLM-L12-v2",
        }
    }

    /// HuggingFace model ID
    pub fn hf_id(&self) -> &'static str {
        match self {
            Self::BgeBaseEnV15 => "BAAI/bge-base-en-v1.5",
            Self::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "sentence-transformers/all-MiniLM-L12-v2",
        }
    }

    /// Embedding dimensions
    pub fn dimensions(&self) -> usize {
        match self {
            Self::BgeBaseEnV15 => 768,
            Self::BgeSmallEnV15 => 384,
            Self::AllMiniLmL6V2 => 384,
            Self::AllMiniLmL12V2 => 384,
        }
    }

    /// Approximate model size in MB
    pub fn size_mb(&self) -> u32 {
        match self {
            Self::BgeBaseEnV15 => 418,
            Self::BgeSmallEnV15 => 134,
            Self::AllMiniLmL6V2 => 86,
            Self::AllMiniLmL12V2 => 134,
        }
    }
}

/// Where chunk embeddings come from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Candle BERT model on this machine
    #[default]
    Local,
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAi,
    /// Skip embeddings; chunks carry an empty vector
    Disabled,
}

/// Chunk boundary settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub policy: ChunkPolicy,
    /// Maximum chunk length in chars
    pub chunk_size: usize,
    /// Sentence policy only
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            policy: ChunkPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Remote embedding endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    /// Requested vector size, for models that support shortening
    pub dimensions: Option<usize>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Total attempts per batch, including the first
    pub max_attempts: usize,
    /// Backoff before the second attempt; doubles on each retry
    pub retry_base_delay_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            retry_base_delay_ms: 500,
        }
    }
}

/// Embedding settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Local model (backend = "local")
    pub model: EmbeddingModel,
    /// Device preference (auto, cpu, metal, cuda)
    pub device: DevicePreference,
    /// Chunks per embedding request
    pub batch_size: usize,
    pub openai: OpenAiConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: EmbeddingModel::default(),
            device: DevicePreference::default(),
            batch_size: 32,
            openai: OpenAiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    pub max_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_SUMMARY_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Files processed at once during directory ingestion
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 2 }
    }
}

/// study-ingest configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Version of config schema (for future migrations)
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            summary: SummaryConfig::default(),
            pipeline: PipelineConfig::default(),
            version: 1,
        }
    }
}

impl Config {
    /// Get the config file path (~/.study-ingest/config.toml)
    pub fn path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.toml"))
    }

    /// Load config from the default location, or return None if it doesn't exist
    pub fn load() -> Result<Option<Self>> {
        Self::load_at(&Self::path()?)
    }

    /// Load config from `path`, or return None if it doesn't exist
    pub fn load_at(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(path).map(Some)
    }

    /// Load and validate config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit file if given (must exist), else the default file if present, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Ok(Self::load()?.unwrap_or_default()),
        }
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> std::result::Result<(), IngestError> {
        let invalid = |msg: String| Err(IngestError::InvalidConfig(msg));

        if self.chunking.chunk_size == 0 {
            return invalid("chunking.chunk_size must be at least 1".to_string());
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            return invalid(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            ));
        }
        if self.embedding.batch_size == 0 {
            return invalid("embedding.batch_size must be at least 1".to_string());
        }
        if self.embedding.openai.max_attempts == 0 {
            return invalid("embedding.openai.max_attempts must be at least 1".to_string());
        }
        if self.embedding.openai.timeout_secs == 0 {
            return invalid("embedding.openai.timeout_secs must be at least 1".to_string());
        }
        if self.summary.max_chars == 0 {
            return invalid("summary.max_chars must be at least 1".to_string());
        }
        if self.pipeline.concurrency == 0 {
            return invalid("pipeline.concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Get the base directory path (~/.study-ingest)
pub fn base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".study-ingest"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunking.policy, ChunkPolicy::Fixed);
        assert_eq!(config.chunking.chunk_size, 5000);
        assert_eq!(config.embedding.backend, EmbeddingBackend::Local);
        assert_eq!(config.embedding.model, EmbeddingModel::AllMiniLmL12V2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_metadata() {
        let model = EmbeddingModel::BgeBaseEnV15;
        assert_eq!(model.dimensions(), 768);
        assert_eq!(model.size_mb(), 418);
        assert_eq!(model.hf_id(), "BAAI/bge-base-en-v1.5");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [chunking]
            policy = "sentence"
            overlap = 200

            [embedding]
            backend = "openai"

            [embedding.openai]
            model = "text-embedding-3-large"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.chunking.policy, ChunkPolicy::Sentence);
        assert_eq!(parsed.chunking.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(parsed.chunking.overlap, 200);
        assert_eq!(parsed.embedding.backend, EmbeddingBackend::OpenAi);
        assert_eq!(parsed.embedding.openai.model, "text-embedding-3-large");
        assert_eq!(parsed.embedding.openai.max_attempts, 3);
        assert_eq!(parsed.summary.max_chars, DEFAULT_SUMMARY_CHARS);
        assert_eq!(parsed.version, 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.chunking.overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(IngestError::InvalidConfig(_))));

        let mut config = Config::default();
        config.pipeline.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.embedding.backend = EmbeddingBackend::Disabled;
        config.chunking.chunk_size = 1200;
        config.save_to(&path).unwrap();

        let loaded = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_at_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(Config::load_at(&path).unwrap().is_none());

        Config::default().save_to(&path).unwrap();
        assert_eq!(Config::load_at(&path).unwrap(), Some(Config::default()));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
