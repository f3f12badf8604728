// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding provider interface and the built-in hashing embedder

use crate::errors::KbError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Maps text to a fixed-dimension vector
///
/// Used both to build an index and to embed queries against it. The same
/// provider (or a dimensionally and semantically compatible one) must be used
/// for both; [`fingerprint`](EmbeddingProvider::fingerprint) identifies the
/// provider so persisted indexes can reject a mismatched one at load time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, KbError>;

    /// Embed several texts, preserving input order
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, KbError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Output vector dimension
    fn dimension(&self) -> usize;

    /// Stable identity of this provider (model + parameters)
    fn fingerprint(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    pub normalize: bool,
    pub lowercase: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            normalize: true,
            lowercase: true,
        }
    }
}

/// Hash positions per token; two positions keep a single accidental bucket
/// collision from tying an unrelated text with a genuinely overlapping one
const TOKEN_HASH_COUNT: u64 = 2;

/// Deterministic token-feature-hashing embedder
///
/// Each token is hashed into [`TOKEN_HASH_COUNT`] of `dimension` buckets and
/// counted; the resulting bag-of-words vector is optionally L2-normalized.
/// Texts sharing tokens get correlated vectors, so nearest-neighbor search
/// surfaces chunks with word overlap. No model weights, no network calls,
/// fully deterministic — suitable for tests, demos, and as a stand-in until
/// a model-backed provider is wired in.
pub struct HashingEmbedder {
    config: EmbeddingConfig,
}

impl HashingEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self, KbError> {
        if config.dimension == 0 {
            return Err(KbError::Embedding(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self { config })
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| {
                if self.config.lowercase {
                    t.to_lowercase()
                } else {
                    t.to_string()
                }
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, KbError> {
        let mut embedding = vec![0.0f32; self.config.dimension];

        for token in self.tokens(text) {
            for seed in 0..TOKEN_HASH_COUNT {
                let mut hasher = DefaultHasher::new();
                seed.hash(&mut hasher);
                token.hash(&mut hasher);
                let bucket = (hasher.finish() % self.config.dimension as u64) as usize;
                embedding[bucket] += 1.0;
            }
        }

        if self.config.normalize {
            let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut embedding {
                    *value /= norm;
                }
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "hashing-embedder:v1:dim={}:hashes={}:normalize={}:lowercase={}",
            self.config.dimension, TOKEN_HASH_COUNT, self.config.normalize, self.config.lowercase
        ));
        let digest = hasher.finalize();
        format!("hashing-v1-{:x}", digest)[..24].to_string()
    }
}
