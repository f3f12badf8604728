// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Document record commit marker

use crate::errors::KbError;
use crate::storage::{write_atomic, DocumentLayout};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk record format version
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Commit marker for a persisted document record
///
/// Written last during ingestion, after `chunks.json` and `index.json` are
/// both durable. Its presence is what makes a record valid: a document
/// directory without a readable manifest is treated as absent. The recorded
/// counts, dimension and embedder fingerprint are re-checked on load so a
/// half-written or mismatched record is rejected instead of silently served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentManifest {
    pub document_id: String,

    /// Number of chunks (must match chunks.json and index.json)
    pub chunk_count: usize,

    /// Embedding dimension of every vector in index.json
    pub dimensions: usize,

    /// Fingerprint of the embedding provider used at build time
    ///
    /// Loading with a different provider would silently return meaningless
    /// similarity results, so a mismatch is rejected at load time.
    pub embedder_fingerprint: String,

    pub created_at: DateTime<Utc>,

    pub format_version: u32,
}

impl DocumentManifest {
    pub fn new(
        document_id: impl Into<String>,
        chunk_count: usize,
        dimensions: usize,
        embedder_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            chunk_count,
            dimensions,
            embedder_fingerprint: embedder_fingerprint.into(),
            created_at: Utc::now(),
            format_version: MANIFEST_FORMAT_VERSION,
        }
    }

    /// Validate the manifest against the loaded artifacts
    ///
    /// Checks chunk count, vector count, dimension and embedder fingerprint.
    pub fn validate(
        &self,
        chunk_count: usize,
        vector_count: usize,
        dimensions: usize,
        embedder_fingerprint: &str,
    ) -> Result<(), KbError> {
        if self.format_version != MANIFEST_FORMAT_VERSION {
            return Err(KbError::Storage(format!(
                "unsupported record format version {} for {}",
                self.format_version, self.document_id
            )));
        }
        if self.chunk_count != chunk_count {
            return Err(KbError::Storage(format!(
                "chunk count mismatch for {}: manifest says {} but chunk record has {}",
                self.document_id, self.chunk_count, chunk_count
            )));
        }
        if self.chunk_count != vector_count {
            return Err(KbError::Storage(format!(
                "vector count mismatch for {}: manifest says {} chunks but index has {} vectors",
                self.document_id, self.chunk_count, vector_count
            )));
        }
        if self.dimensions != dimensions {
            return Err(KbError::Storage(format!(
                "dimension mismatch for {}: manifest says {}D but index is {}D",
                self.document_id, self.dimensions, dimensions
            )));
        }
        if self.embedder_fingerprint != embedder_fingerprint {
            return Err(KbError::Storage(format!(
                "embedding provider mismatch for {}: index was built with {} but the live provider is {}",
                self.document_id, self.embedder_fingerprint, embedder_fingerprint
            )));
        }
        Ok(())
    }

    /// Write the manifest atomically, committing the record
    pub fn persist(&self, layout: &DocumentLayout) -> Result<(), KbError> {
        let path = layout.manifest_file(&self.document_id)?;
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| KbError::Storage(format!("failed to serialize manifest: {}", e)))?;
        write_atomic(&path, &bytes)
    }

    /// Load the manifest for a document id
    ///
    /// # Errors
    ///
    /// * `NotFound` — no manifest exists (record absent or never committed)
    /// * `Storage` — manifest exists but is unreadable
    pub fn load(layout: &DocumentLayout, document_id: &str) -> Result<Self, KbError> {
        let path = layout.manifest_file(document_id)?;
        if !path.exists() {
            return Err(KbError::NotFound(document_id.to_string()));
        }
        let bytes = std::fs::read(&path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| KbError::Storage(format!("corrupt manifest for {}: {}", document_id, e)))
    }

    /// Remove the manifest, invalidating the record without touching the
    /// underlying artifacts
    ///
    /// Used before re-writing a record so no crash window can pair an old
    /// manifest with new artifacts.
    pub fn invalidate(layout: &DocumentLayout, document_id: &str) -> Result<(), KbError> {
        let path = layout.manifest_file(document_id)?;
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
