// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chunk persistence: the ordered text chunks of one document
//!
//! Chunks are the unit of retrieval. The store keeps one `chunks.json` per
//! document id and replaces it wholesale — a chunk sequence is never
//! partially mutated.

use crate::errors::KbError;
use crate::storage::{write_atomic, DocumentLayout};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A contiguous slice of a document's text, the unit of retrieval
///
/// Immutable once created. `sequence_index` is the chunk's position within
/// its document; reconstructing full-document text requires sequence order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub sequence_index: usize,
    /// Opaque source metadata from the splitter (page numbers, offsets, ...)
    #[serde(default)]
    pub metadata: Value,
}

impl Chunk {
    /// Create a chunk with a placeholder sequence index
    ///
    /// [`ChunkSet::new`] assigns the real index from input order.
    pub fn new(text: impl Into<String>, metadata: Value) -> Self {
        Self {
            text: text.into(),
            sequence_index: 0,
            metadata,
        }
    }
}

/// The complete ordered chunk sequence of one document
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSet {
    document_id: String,
    chunks: Vec<Chunk>,
}

impl ChunkSet {
    /// Build a chunk set from raw chunks, assigning contiguous sequence
    /// indexes from input order
    pub fn new(document_id: impl Into<String>, mut chunks: Vec<Chunk>) -> Self {
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.sequence_index = i;
        }
        Self {
            document_id: document_id.into(),
            chunks,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk at the given sequence index
    pub fn get(&self, sequence_index: usize) -> Option<&Chunk> {
        self.chunks.get(sequence_index)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Iterator over chunk texts in sequence order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.text.as_str())
    }

    /// Full document text: all chunks concatenated in sequence order
    pub fn full_text(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Filesystem-backed chunk store
///
/// One persisted artifact per document id. `write` is durable before
/// returning and atomic (see [`write_atomic`]); `read` fails with `NotFound`
/// when no record exists.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    layout: DocumentLayout,
}

impl ChunkStore {
    pub fn new(layout: DocumentLayout) -> Self {
        Self { layout }
    }

    /// Persist the ordered chunk sequence, replacing any existing one
    pub async fn write(&self, chunk_set: &ChunkSet) -> Result<(), KbError> {
        self.layout.ensure_document_dir(chunk_set.document_id())?;
        let path = self.layout.chunks_file(chunk_set.document_id())?;

        let bytes = serde_json::to_vec(&chunk_set.chunks)
            .map_err(|e| KbError::Storage(format!("failed to serialize chunks: {}", e)))?;
        write_atomic(&path, &bytes)?;

        debug!(
            document_id = %chunk_set.document_id(),
            chunk_count = chunk_set.len(),
            "Persisted chunk sequence"
        );
        Ok(())
    }

    /// Read the ordered chunk sequence for a document id
    ///
    /// # Errors
    ///
    /// * `NotFound` — no chunks file exists for this id
    /// * `Storage` — the file exists but is unreadable or corrupt
    pub async fn read(&self, document_id: &str) -> Result<ChunkSet, KbError> {
        let path = self.layout.chunks_file(document_id)?;
        if !path.exists() {
            return Err(KbError::NotFound(document_id.to_string()));
        }

        let bytes = std::fs::read(&path)?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&bytes).map_err(|e| {
            KbError::Storage(format!(
                "corrupt chunk record for {}: {}",
                document_id, e
            ))
        })?;

        // Sequence indexes must be contiguous from 0; anything else means
        // the record was tampered with or written by a different layout.
        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.sequence_index != i {
                return Err(KbError::Storage(format!(
                    "corrupt chunk record for {}: expected sequence index {} but found {}",
                    document_id, i, chunk.sequence_index
                )));
            }
        }

        Ok(ChunkSet {
            document_id: document_id.to_string(),
            chunks,
        })
    }
}
