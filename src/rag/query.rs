// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval-augmented question answering
//!
//! `ask` flow: guard on an active document, embed the question, fetch the
//! top-k nearest chunks, concatenate their text nearest-first, and hand
//! `{question, context}` to the generation provider. The provider's text is
//! returned verbatim.

use crate::context::DocumentContextManager;
use crate::errors::KbError;
use crate::generation::GenerationProvider;
use crate::rag::{bounded_call, prompts};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A retrieved chunk with its similarity score, nearest-first order
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub sequence_index: usize,
    pub score: f32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
    pub embed_timeout: Duration,
    pub generation_timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: crate::config::DEFAULT_TOP_K,
            embed_timeout: Duration::from_secs(crate::config::DEFAULT_EMBED_TIMEOUT_SECS),
            generation_timeout: Duration::from_secs(
                crate::config::DEFAULT_GENERATION_TIMEOUT_SECS,
            ),
        }
    }
}

pub struct RagQueryService {
    manager: Arc<DocumentContextManager>,
    generator: Arc<dyn GenerationProvider>,
    config: QueryConfig,
}

impl RagQueryService {
    pub fn new(
        manager: Arc<DocumentContextManager>,
        generator: Arc<dyn GenerationProvider>,
        config: QueryConfig,
    ) -> Self {
        Self {
            manager,
            generator,
            config,
        }
    }

    /// Retrieve the k chunks most similar to `query`, nearest first
    ///
    /// Retrieval only — no generation call. Used by `answer` and exposed for
    /// callers that want to inspect what the index returns.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedChunk>, KbError> {
        let active = self.manager.require_active().await?;
        let embedder = Arc::clone(self.manager.embedder());

        let query_vector = bounded_call(
            "embedding",
            self.config.embed_timeout,
            cancel,
            async { embedder.embed(query).await },
            KbError::Embedding,
        )
        .await?;

        let hits = active.index.search_vector(&query_vector, k)?;
        debug!(
            document_id = %active.document_id,
            k,
            hit_count = hits.len(),
            "Retrieved chunks for query"
        );

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                active.chunks.get(hit.sequence_index).map(|chunk| RetrievedChunk {
                    sequence_index: hit.sequence_index,
                    score: hit.score,
                    text: chunk.text.clone(),
                })
            })
            .collect())
    }

    /// Answer a question grounded in the active document
    ///
    /// # Errors
    ///
    /// * `NoActiveDocument` — no document is active
    /// * `Embedding` — the question could not be embedded (or timed out)
    /// * `Generation` — the provider failed (or timed out)
    /// * `Cancelled` — the caller abandoned the request
    pub async fn answer(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, KbError> {
        let retrieved = self.retrieve(question, self.config.top_k, cancel).await?;

        let context: String = retrieved
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = prompts::answer(question);
        bounded_call(
            "generation",
            self.config.generation_timeout,
            cancel,
            async { self.generator.generate(&prompt, &context).await },
            KbError::Generation,
        )
        .await
    }
}
