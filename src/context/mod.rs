// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document context manager: the single active-document slot
//!
//! At most one document's `(VectorIndex, ChunkSet)` pair is held in memory at
//! a time. Activation swaps the slot; queries snapshot it. The manager owns
//! the dual-write sequencing of a document record (chunks, index, then the
//! manifest commit marker) and treats any single failure as a total failure.
//!
//! ## State machine
//!
//! `Empty` → `Loading` → `Active(id)`. Activating a different id discards
//! only the in-memory state of the previous document — its durable record
//! stays on disk and can be re-activated later. Re-activating the currently
//! active id from storage is a no-op that touches neither disk nor the slot.
//!
//! ## Concurrency
//!
//! Activations are serialized by an async mutex held for the whole
//! operation. The slot itself is behind a `tokio::sync::RwLock`; queries
//! take the read lock only long enough to clone the `Arc`s out, so a query
//! holding a snapshot stays consistent even if the slot is swapped under it.
//! This is deliberately a single process-wide slot (one manager instance);
//! per-session multi-tenancy would mean one manager per session, not a
//! bigger slot.

use crate::embeddings::EmbeddingProvider;
use crate::errors::KbError;
use crate::storage::{Chunk, ChunkSet, ChunkStore, DocumentLayout, DocumentManifest};
use crate::vector::{IndexStore, VectorIndex};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Snapshot of the active document, handed to query services
///
/// Holds `Arc`s into the slot's state; cheap to clone and valid for the
/// lifetime of the query even if another document is activated meanwhile.
#[derive(Clone, Debug)]
pub struct ActiveDocument {
    pub document_id: String,
    pub index: Arc<VectorIndex>,
    pub chunks: Arc<ChunkSet>,
}

struct ActiveSlot {
    document_id: String,
    index: Arc<VectorIndex>,
    chunks: Arc<ChunkSet>,
}

/// Owner of the active-document slot and the document record lifecycle
pub struct DocumentContextManager {
    layout: DocumentLayout,
    chunk_store: ChunkStore,
    index_store: IndexStore,
    embedder: Arc<dyn EmbeddingProvider>,
    active: RwLock<Option<ActiveSlot>>,
    /// Serializes activations; queries are not blocked by this
    activation: Mutex<()>,
}

impl DocumentContextManager {
    pub fn new(data_dir: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let layout = DocumentLayout::new(data_dir);
        Self {
            chunk_store: ChunkStore::new(layout.clone()),
            index_store: IndexStore::new(layout.clone()),
            layout,
            embedder,
            active: RwLock::new(None),
            activation: Mutex::new(()),
        }
    }

    /// Embedding provider bound to this manager
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Ingest a freshly uploaded document and make it active
    ///
    /// Builds the vector index from `chunks`, persists the chunk record, the
    /// index record, and finally the manifest commit marker, then swaps the
    /// active slot to this document. Re-uploading an existing id replaces
    /// its record wholesale.
    ///
    /// On any failure the active slot is left unchanged and the partially
    /// written record is rolled back — a later [`activate_from_storage`]
    /// cannot observe a half-written document.
    ///
    /// [`activate_from_storage`]: Self::activate_from_storage
    ///
    /// # Errors
    ///
    /// * `Embedding` — the provider failed for any chunk (nothing persisted)
    /// * `Storage` — persistence failed (record rolled back)
    pub async fn activate_from_upload(
        &self,
        document_id: &str,
        chunks: Vec<Chunk>,
    ) -> Result<(), KbError> {
        let _guard = self.activation.lock().await;
        crate::storage::validate_document_id(document_id)?;

        let chunk_set = ChunkSet::new(document_id, chunks);

        // Embedding happens before anything touches disk, so an embedding
        // failure leaves no trace.
        let index = VectorIndex::build(&chunk_set, self.embedder.as_ref()).await?;

        // Invalidate any committed record for this id up front: from here
        // on the directory is uncommitted until the new manifest lands.
        DocumentManifest::invalidate(&self.layout, document_id)?;

        if let Err(e) = self.persist_record(&chunk_set, &index).await {
            self.rollback(document_id);
            return Err(e);
        }

        let chunk_count = chunk_set.len();
        self.swap_active(document_id, index, chunk_set).await;
        info!(
            document_id = %document_id,
            chunk_count,
            "✅ Document ingested and activated"
        );
        Ok(())
    }

    async fn persist_record(
        &self,
        chunk_set: &ChunkSet,
        index: &VectorIndex,
    ) -> Result<(), KbError> {
        self.chunk_store.write(chunk_set).await?;
        self.index_store
            .persist(chunk_set.document_id(), index)
            .await?;

        let manifest = DocumentManifest::new(
            chunk_set.document_id(),
            chunk_set.len(),
            index.dimensions(),
            self.embedder.fingerprint(),
        );
        manifest.persist(&self.layout)
    }

    fn rollback(&self, document_id: &str) {
        if let Err(e) = self.layout.remove_document_dir(document_id) {
            // The record is already uncommitted (no manifest), so a failed
            // cleanup only leaves dead files behind.
            warn!(
                document_id = %document_id,
                error = %e,
                "Failed to roll back partially written document record"
            );
        }
    }

    /// Load a previously ingested document from disk and make it active
    ///
    /// Re-activating the currently active id is a no-op and touches no
    /// storage. On failure the previously active document (if any) remains
    /// active.
    ///
    /// # Errors
    ///
    /// * `NotFound` — no committed record for this id (missing manifest or
    ///   either artifact)
    /// * `Storage` — the record exists but is corrupt, inconsistent, or was
    ///   built with a different embedding provider
    pub async fn activate_from_storage(&self, document_id: &str) -> Result<(), KbError> {
        let _guard = self.activation.lock().await;
        crate::storage::validate_document_id(document_id)?;

        if let Some(active) = self.active.read().await.as_ref() {
            if active.document_id == document_id {
                info!(document_id = %document_id, "Document is already active");
                return Ok(());
            }
        }

        let manifest = DocumentManifest::load(&self.layout, document_id)?;
        let chunk_set = self.chunk_store.read(document_id).await?;
        let index = self.index_store.load(document_id).await?;

        manifest.validate(
            chunk_set.len(),
            index.len(),
            index.dimensions(),
            &self.embedder.fingerprint(),
        )?;

        let chunk_count = chunk_set.len();
        self.swap_active(document_id, index, chunk_set).await;
        info!(
            document_id = %document_id,
            chunk_count,
            "✅ Document context loaded from storage"
        );
        Ok(())
    }

    async fn swap_active(&self, document_id: &str, index: VectorIndex, chunks: ChunkSet) {
        let mut slot = self.active.write().await;
        if let Some(previous) = slot.as_ref() {
            if previous.document_id != document_id {
                info!(
                    previous = %previous.document_id,
                    next = %document_id,
                    "Discarding in-memory context for previous document"
                );
            }
        }
        *slot = Some(ActiveSlot {
            document_id: document_id.to_string(),
            index: Arc::new(index),
            chunks: Arc::new(chunks),
        });
    }

    /// Id of the currently active document, if any
    pub async fn active_document_id(&self) -> Option<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|slot| slot.document_id.clone())
    }

    /// Snapshot the active document, or fail if none is active
    ///
    /// The guard used by every downstream query.
    pub async fn require_active(&self) -> Result<ActiveDocument, KbError> {
        let slot = self.active.read().await;
        match slot.as_ref() {
            Some(active) => Ok(ActiveDocument {
                document_id: active.document_id.clone(),
                index: Arc::clone(&active.index),
                chunks: Arc::clone(&active.chunks),
            }),
            None => Err(KbError::NoActiveDocument),
        }
    }
}
