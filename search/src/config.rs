use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Module configuration, persisted as TOML.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SearchConfig {
    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates config values and returns list of validation errors.
    /// Returns empty vec if config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.engine.writer_heap_bytes < EngineConfig::MIN_WRITER_HEAP_BYTES {
            errors.push(format!(
                "writer_heap_bytes must be at least {}",
                EngineConfig::MIN_WRITER_HEAP_BYTES
            ));
        }

        if self.engine.search_limit == 0 {
            errors.push("search_limit must be at least 1".to_string());
        }

        if self.index.root.as_os_str().is_empty() {
            errors.push("index root must not be empty".to_string());
        }

        errors
    }

    /// Returns a validated config, replacing invalid values with defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = Self::default();
        Self {
            index: IndexConfig {
                root: if self.index.root.as_os_str().is_empty() {
                    defaults.index.root
                } else {
                    self.index.root.clone()
                },
                with_source: self.index.with_source,
            },
            engine: EngineConfig {
                writer_heap_bytes: if self.engine.writer_heap_bytes
                    < EngineConfig::MIN_WRITER_HEAP_BYTES
                {
                    defaults.engine.writer_heap_bytes
                } else {
                    self.engine.writer_heap_bytes
                },
                search_limit: if self.engine.search_limit == 0 {
                    defaults.engine.search_limit
                } else {
                    self.engine.search_limit
                },
            },
        }
    }
}

/// Where index directories live and what they retain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Parent directory for per-index directories.
    #[serde(default = "default_index_root")]
    pub root: PathBuf,
    /// Retain original document bytes so FT.GET can return them.
    #[serde(default = "default_true")]
    pub with_source: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root: default_index_root(),
            with_source: true,
        }
    }
}

/// Tuning for the full-text engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_writer_heap_bytes")]
    pub writer_heap_bytes: usize,
    /// Maximum number of hits FT.QUERY returns.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl EngineConfig {
    /// Smallest writer budget the engine accepts for one indexing thread.
    pub const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            writer_heap_bytes: default_writer_heap_bytes(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_index_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_writer_heap_bytes() -> usize {
    50_000_000
}

fn default_search_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Errors that can occur when loading or saving config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
