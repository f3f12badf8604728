// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Facade for the surrounding application
//!
//! One struct exposing the inbound operation set — upload, load-context,
//! ask, summary, key concepts, generated Q&A, flashcards — each returning a
//! success payload or a typed [`KbError`]. Request handlers (HTTP, CLI, ...)
//! hold this service by `Arc` and call straight through; every AI operation
//! is guarded by the active-document check inside the context manager.

use crate::config::KbConfig;
use crate::context::DocumentContextManager;
use crate::embeddings::EmbeddingProvider;
use crate::errors::KbError;
use crate::generation::GenerationProvider;
use crate::rag::document_ops::DocumentOps;
use crate::rag::parse::QaPair;
use crate::rag::query::{QueryConfig, RagQueryService, RetrievedChunk};
use crate::storage::Chunk;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct DocumentQaService {
    manager: Arc<DocumentContextManager>,
    query: RagQueryService,
    ops: DocumentOps,
}

impl DocumentQaService {
    pub fn new(
        config: &KbConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        let manager = Arc::new(DocumentContextManager::new(
            config.data_dir.clone(),
            embedder,
        ));
        let query = RagQueryService::new(
            Arc::clone(&manager),
            Arc::clone(&generator),
            QueryConfig {
                top_k: config.top_k,
                embed_timeout: config.embed_timeout,
                generation_timeout: config.generation_timeout,
            },
        );
        let ops = DocumentOps::new(
            Arc::clone(&manager),
            generator,
            config.generation_timeout,
        );
        Self {
            manager,
            query,
            ops,
        }
    }

    /// The underlying context manager (activation state, embedder)
    pub fn manager(&self) -> &Arc<DocumentContextManager> {
        &self.manager
    }

    /// Ingest an uploaded document's chunks and activate it
    pub async fn upload(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<(), KbError> {
        self.manager.activate_from_upload(document_id, chunks).await
    }

    /// Load a previously ingested document's context into memory
    pub async fn load_context(&self, document_id: &str) -> Result<(), KbError> {
        self.manager.activate_from_storage(document_id).await
    }

    /// Id of the currently active document, if any
    pub async fn active_document_id(&self) -> Option<String> {
        self.manager.active_document_id().await
    }

    /// Answer a question against the active document
    pub async fn ask(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, KbError> {
        self.query.answer(question, cancel).await
    }

    /// Retrieval-only search over the active document
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedChunk>, KbError> {
        self.query.retrieve(query, k, cancel).await
    }

    /// Summarize the active document
    pub async fn summary(&self, cancel: &CancellationToken) -> Result<String, KbError> {
        self.ops.summarize(cancel).await
    }

    /// Key concepts of the active document
    pub async fn key_concepts(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, KbError> {
        self.ops.key_concepts(cancel).await
    }

    /// Exam-style Q&A pairs over the active document
    pub async fn generate_qa(&self, cancel: &CancellationToken) -> Result<Vec<QaPair>, KbError> {
        self.ops.generate_qa(cancel).await
    }

    /// Flashcards over the active document
    pub async fn flashcards(&self, cancel: &CancellationToken) -> Result<Vec<QaPair>, KbError> {
        self.ops.flashcards(cancel).await
    }
}
