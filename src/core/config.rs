use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use crate::analysis::analyzer::AnalyzerConfig;
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, Result};
use crate::scoring::scorer::Similarity;
use crate::search::fuzzy::FuzzyConfig;

pub const DEFAULT_FIELD: &str = "text_content";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_path: PathBuf,
    pub field_name: String,

    // Build settings
    pub similarity: Similarity,
    pub retain_original: bool,
    pub commit_batch_size: usize,   // Checkpoint every N accepted documents
    pub compression: CompressionType,
    pub indexing_threads: usize,    // Rayon pool for per-document analysis

    pub analyzer: AnalyzerConfig,
    pub fuzzy: FuzzyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./index"),
            field_name: DEFAULT_FIELD.to_string(),
            similarity: Similarity::Bm25,
            retain_original: true,
            commit_batch_size: 5000,
            compression: CompressionType::LZ4,
            indexing_threads: num_cpus::get(),
            analyzer: AnalyzerConfig::standard(),
            fuzzy: FuzzyConfig::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.commit_batch_size == 0 {
            return Err(Error::config("commit_batch_size must be at least 1"));
        }
        if self.indexing_threads == 0 {
            return Err(Error::config("indexing_threads must be at least 1"));
        }
        if self.field_name.is_empty() {
            return Err(Error::config("field_name must not be empty"));
        }
        self.analyzer.validate()?;
        self.fuzzy.validate()?;
        Ok(())
    }
}
