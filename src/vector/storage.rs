// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector index persistence
//!
//! One `index.json` per document id: the embedding dimension plus the raw
//! vectors in chunk sequence order. Loading re-validates every vector, so a
//! truncated or hand-edited file is rejected with `Storage` instead of
//! producing skewed similarity scores.

use crate::errors::KbError;
use crate::storage::{write_atomic, DocumentLayout};
use crate::vector::VectorIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk shape of a persisted index
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

/// Filesystem-backed index store
#[derive(Debug, Clone)]
pub struct IndexStore {
    layout: DocumentLayout,
}

impl IndexStore {
    pub fn new(layout: DocumentLayout) -> Self {
        Self { layout }
    }

    /// Persist the index under the document id, replacing any existing one
    pub async fn persist(&self, document_id: &str, index: &VectorIndex) -> Result<(), KbError> {
        self.layout.ensure_document_dir(document_id)?;
        let path = self.layout.index_file(document_id)?;

        let file = IndexFile {
            dimensions: index.dimensions(),
            vectors: index.vectors().to_vec(),
        };
        let bytes = serde_json::to_vec(&file)
            .map_err(|e| KbError::Storage(format!("failed to serialize index: {}", e)))?;
        write_atomic(&path, &bytes)?;

        debug!(
            document_id = %document_id,
            vector_count = index.len(),
            dimensions = index.dimensions(),
            "Persisted vector index"
        );
        Ok(())
    }

    /// Load and validate the index for a document id
    ///
    /// # Errors
    ///
    /// * `NotFound` — no index file exists for this id
    /// * `Storage` — the file is unreadable, corrupt, or dimensionally
    ///   inconsistent
    pub async fn load(&self, document_id: &str) -> Result<VectorIndex, KbError> {
        let path = self.layout.index_file(document_id)?;
        if !path.exists() {
            return Err(KbError::NotFound(document_id.to_string()));
        }

        let bytes = std::fs::read(&path)?;
        let file: IndexFile = serde_json::from_slice(&bytes).map_err(|e| {
            KbError::Storage(format!("corrupt index record for {}: {}", document_id, e))
        })?;

        VectorIndex::from_vectors(file.dimensions, file.vectors)
    }
}
