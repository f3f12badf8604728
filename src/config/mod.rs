// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Knowledge-base configuration
//!
//! Defaults, overridden by an optional TOML file, overridden by environment
//! variables (`DOCQA_*`). The binary loads `.env` via dotenv before this
//! runs; the library itself never reads config implicitly.

use crate::embeddings::EmbeddingConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of chunks retrieved for a question
pub const DEFAULT_TOP_K: usize = 4;
/// Default time budget for one embedding call
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;
/// Default time budget for one generation call
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct KbConfig {
    /// Directory holding one record directory per document id
    pub data_dir: PathBuf,
    /// Top-k chunks fetched for retrieval-augmented answers
    pub top_k: usize,
    pub embedding: EmbeddingConfig,
    pub embed_timeout: Duration,
    pub generation_timeout: Duration,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/documents"),
            top_k: DEFAULT_TOP_K,
            embedding: EmbeddingConfig::default(),
            embed_timeout: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }
}

/// TOML file shape; every field optional so a partial file works
#[derive(Debug, Default, Deserialize)]
struct KbConfigFile {
    data_dir: Option<PathBuf>,
    top_k: Option<usize>,
    embedding_dimension: Option<usize>,
    embed_timeout_secs: Option<u64>,
    generation_timeout_secs: Option<u64>,
}

impl KbConfig {
    /// Defaults + env-var overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Defaults + TOML file + env-var overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let file: KbConfigFile = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        let mut config = Self::default();
        config.apply_file(file);
        config.apply_env();
        Ok(config)
    }

    fn apply_file(&mut self, file: KbConfigFile) {
        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(top_k) = file.top_k {
            self.top_k = top_k;
        }
        if let Some(dimension) = file.embedding_dimension {
            self.embedding.dimension = dimension;
        }
        if let Some(secs) = file.embed_timeout_secs {
            self.embed_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.generation_timeout_secs {
            self.generation_timeout = Duration::from_secs(secs);
        }
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = env::var("DOCQA_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(top_k) = parse_env("DOCQA_TOP_K") {
            self.top_k = top_k;
        }
        if let Some(dimension) = parse_env("DOCQA_EMBEDDING_DIMENSION") {
            self.embedding.dimension = dimension;
        }
        if let Some(secs) = parse_env("DOCQA_EMBED_TIMEOUT_SECS") {
            self.embed_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env("DOCQA_GENERATION_TIMEOUT_SECS") {
            self.generation_timeout = Duration::from_secs(secs);
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
