//! Run configuration for `kg-ingest`.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `KG_CHUNK_SIZE` / `KG_DELAY_SECS`, then command-line flags.

use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::ReferenceAnchor;
use crate::pipeline::{PipelineOptions, SourceErrorPolicy, SourceSpec};

pub const DEFAULT_DELAY_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Fully-resolved ingestion run configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub chunk_size: NonZeroUsize,
    /// Pause between consecutive chunk submissions.
    pub delay: Duration,
    pub on_source_error: SourceErrorPolicy,
    pub contract_anchor: ReferenceAnchor,
    pub sources: Vec<SourceSpec>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: NonZeroUsize::MIN,
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            on_source_error: SourceErrorPolicy::Abort,
            contract_anchor: ReferenceAnchor::IngestionTime,
            sources: Vec::new(),
        }
    }
}

/// Raw TOML shape, before defaults and validation.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    chunk_size: Option<usize>,
    delay_secs: Option<u64>,
    on_source_error: Option<SourceErrorPolicy>,
    contract_anchor: Option<ReferenceAnchor>,
    #[serde(default)]
    sources: Vec<SourceSpec>,
}

fn chunk_size(value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value)
        .ok_or_else(|| ConfigError::Invalid("chunk_size must be at least 1".to_string()))
}

impl IngestConfig {
    /// Load a TOML file. Relative source locations are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&text, base_dir)
    }

    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let defaults = Self::default();

        let sources = raw
            .sources
            .into_iter()
            .map(|spec| SourceSpec {
                location: if spec.location.is_relative() {
                    base_dir.join(&spec.location)
                } else {
                    spec.location
                },
                source_type: spec.source_type,
            })
            .collect();

        Ok(Self {
            chunk_size: raw
                .chunk_size
                .map(chunk_size)
                .transpose()?
                .unwrap_or(defaults.chunk_size),
            delay: raw
                .delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.delay),
            on_source_error: raw.on_source_error.unwrap_or(defaults.on_source_error),
            contract_anchor: raw.contract_anchor.unwrap_or(defaults.contract_anchor),
            sources,
        })
    }

    /// Apply `KG_CHUNK_SIZE` and `KG_DELAY_SECS` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("KG_CHUNK_SIZE") {
            let value: usize = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("KG_CHUNK_SIZE={:?}", raw)))?;
            self.chunk_size = chunk_size(value)?;
        }

        if let Some(raw) = lookup("KG_DELAY_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("KG_DELAY_SECS={:?}", raw)))?;
            self.delay = Duration::from_secs(secs);
        }

        Ok(())
    }

    pub fn set_chunk_size(&mut self, value: usize) -> Result<(), ConfigError> {
        self.chunk_size = chunk_size(value)?;
        Ok(())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            chunk_size: self.chunk_size,
            on_source_error: self.on_source_error,
        }
    }
}
