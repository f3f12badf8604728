// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Durable storage for document records
//!
//! Each document id owns one directory under the configured data dir:
//!
//! ```text
//! <data_dir>/<document_id>/
//!   chunks.json     ordered chunk sequence (ChunkSet)
//!   index.json      embedding vectors, one per chunk in sequence order
//!   manifest.json   commit marker, written last (see DocumentManifest)
//! ```
//!
//! All writes go through [`write_atomic`]: temp file in the target directory,
//! fsync, then rename over the destination. A reader observes either the full
//! prior artifact or the full new one, never a partial file. A directory
//! without a readable manifest is treated as an absent record.

pub mod chunk_store;
pub mod manifest;

pub use chunk_store::{Chunk, ChunkSet, ChunkStore};
pub use manifest::DocumentManifest;

use crate::errors::KbError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Filename of the persisted chunk sequence
pub const CHUNKS_FILE: &str = "chunks.json";
/// Filename of the persisted vector index
pub const INDEX_FILE: &str = "index.json";
/// Filename of the commit marker
pub const MANIFEST_FILE: &str = "manifest.json";

/// Path layout for per-document record directories
///
/// Document ids become directory names, so they are validated here before
/// ever touching the filesystem: non-empty, ASCII alphanumeric plus `-`,
/// `_` and `.`, and not a relative-path special name.
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    root: PathBuf,
}

impl DocumentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Base data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all artifacts for one document id
    ///
    /// # Errors
    ///
    /// Fails with `Storage` if the id is empty or contains characters that
    /// are unsafe as a path component.
    pub fn document_dir(&self, document_id: &str) -> Result<PathBuf, KbError> {
        validate_document_id(document_id)?;
        Ok(self.root.join(document_id))
    }

    pub fn chunks_file(&self, document_id: &str) -> Result<PathBuf, KbError> {
        Ok(self.document_dir(document_id)?.join(CHUNKS_FILE))
    }

    pub fn index_file(&self, document_id: &str) -> Result<PathBuf, KbError> {
        Ok(self.document_dir(document_id)?.join(INDEX_FILE))
    }

    pub fn manifest_file(&self, document_id: &str) -> Result<PathBuf, KbError> {
        Ok(self.document_dir(document_id)?.join(MANIFEST_FILE))
    }

    /// Create the document directory if it does not exist yet
    pub fn ensure_document_dir(&self, document_id: &str) -> Result<PathBuf, KbError> {
        let dir = self.document_dir(document_id)?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove a document directory and everything in it (upload rollback)
    pub fn remove_document_dir(&self, document_id: &str) -> Result<(), KbError> {
        let dir = self.document_dir(document_id)?;
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Validate a document id for use as a directory name
pub fn validate_document_id(document_id: &str) -> Result<(), KbError> {
    if document_id.is_empty() {
        return Err(KbError::Storage(
            "document id must not be empty".to_string(),
        ));
    }
    if document_id == "." || document_id == ".." {
        return Err(KbError::Storage(format!(
            "invalid document id: {:?}",
            document_id
        )));
    }
    if !document_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(KbError::Storage(format!(
            "invalid document id {:?}: only ASCII alphanumerics, '-', '_' and '.' are allowed",
            document_id
        )));
    }
    Ok(())
}

/// Write `bytes` to `path` atomically
///
/// The data lands in a temp file in the same directory, is synced to disk,
/// and is then renamed over the destination. Readers never observe a
/// partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), KbError> {
    let dir = path
        .parent()
        .ok_or_else(|| KbError::Storage(format!("no parent directory for {}", path.display())))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| KbError::Storage(format!("failed to replace {}: {}", path.display(), e)))?;
    Ok(())
}
