// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory vector index over one document's chunks
//!
//! One embedding per chunk, held in sequence order, searched by exact cosine
//! similarity. Exact search keeps result ordering fully deterministic: ties
//! are broken by ascending sequence index, and a fixed index plus a fixed
//! query always produce the same ranking.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let index = VectorIndex::build(&chunk_set, embedder.as_ref()).await?;
//! let hits = index.search("what is in the conclusion?", 4, embedder.as_ref()).await?;
//! for hit in hits {
//!     println!("chunk {} scored {}", hit.sequence_index, hit.score);
//! }
//! ```

use crate::embeddings::EmbeddingProvider;
use crate::errors::KbError;
use crate::storage::ChunkSet;
use futures::stream::{self, TryStreamExt};
use tracing::debug;

/// How many chunks are embedded concurrently during a build
const BUILD_CONCURRENCY: usize = 4;

/// A search hit: chunk reference plus its similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// Sequence index of the chunk within its document
    pub sequence_index: usize,
    /// Cosine similarity to the query (higher is nearer)
    pub score: f32,
}

/// Similarity-searchable embedding index, 1:1 with a ChunkSet
///
/// `vectors[i]` is the embedding of the chunk with sequence index `i`; the
/// invariant that every chunk has exactly one embedding (and vice versa) is
/// enforced at build time and re-verified against the manifest on load.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Build an index from a chunk set, one embedding per chunk
    ///
    /// Chunks are embedded with bounded concurrency but results stay in
    /// sequence order. Any provider failure fails the whole build — a
    /// partial index is never returned.
    ///
    /// # Errors
    ///
    /// * `Embedding` — the provider failed for any chunk, or returned a
    ///   vector of the wrong dimension or with non-finite values
    pub async fn build(
        chunk_set: &ChunkSet,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self, KbError> {
        let dimensions = embedder.dimension();

        let vectors: Vec<Vec<f32>> = stream::iter(chunk_set.texts().map(Ok::<_, KbError>))
            .map_ok(|text| async move { embedder.embed(text).await })
            .try_buffered(BUILD_CONCURRENCY)
            .try_collect()
            .await?;

        for (i, vector) in vectors.iter().enumerate() {
            validate_vector(vector, dimensions).map_err(|reason| {
                KbError::Embedding(format!("invalid embedding for chunk {}: {}", i, reason))
            })?;
        }

        debug!(
            document_id = %chunk_set.document_id(),
            vector_count = vectors.len(),
            dimensions,
            "Built vector index"
        );

        Ok(Self {
            dimensions,
            vectors,
        })
    }

    /// Reassemble an index from persisted vectors
    ///
    /// Used by [`IndexStore::load`](crate::vector::IndexStore::load); every
    /// vector is re-validated so a corrupt record is rejected here rather
    /// than skewing similarity scores later.
    pub(crate) fn from_vectors(
        dimensions: usize,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, KbError> {
        if dimensions == 0 {
            return Err(KbError::Storage("index dimension must be > 0".to_string()));
        }
        for (i, vector) in vectors.iter().enumerate() {
            validate_vector(vector, dimensions)
                .map_err(|reason| KbError::Storage(format!("corrupt vector {}: {}", i, reason)))?;
        }
        Ok(Self {
            dimensions,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub(crate) fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Embed `query_text` and return the k nearest chunks
    pub async fn search(
        &self,
        query_text: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>, KbError> {
        let query = embedder.embed(query_text).await?;
        self.search_vector(&query, k)
    }

    /// Return up to k chunk references nearest to `query`, nearest first
    ///
    /// Fewer than k chunks in the index returns all of them; `k == 0`
    /// returns an empty result. Ordering is deterministic: descending
    /// cosine similarity, ties broken by ascending sequence index.
    ///
    /// # Errors
    ///
    /// * `Embedding` — the query vector has the wrong dimension
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, KbError> {
        if query.len() != self.dimensions {
            return Err(KbError::Embedding(format!(
                "query dimension mismatch: index is {}D but query is {}D",
                self.dimensions,
                query.len()
            )));
        }

        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<ScoredChunk> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(sequence_index, vector)| ScoredChunk {
                sequence_index,
                score: cosine_similarity(query, vector),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.sequence_index.cmp(&b.sequence_index))
        });
        results.truncate(k);

        Ok(results)
    }
}

fn validate_vector(vector: &[f32], dimensions: usize) -> Result<(), String> {
    if vector.len() != dimensions {
        return Err(format!(
            "expected {} dimensions, got {}",
            dimensions,
            vector.len()
        ));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err("contains NaN or Infinity".to_string());
    }
    Ok(())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
