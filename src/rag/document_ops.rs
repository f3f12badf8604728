// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Whole-document operations: summary, key concepts, Q&A pairs, flashcards
//!
//! Unlike question answering, these use the *entire* chunk sequence (in
//! sequence order) as generation context, not a similarity search. The
//! structured operations parse the provider's output strictly — see
//! [`crate::rag::parse`] for the policy.

use crate::context::DocumentContextManager;
use crate::errors::KbError;
use crate::generation::GenerationProvider;
use crate::rag::parse::{self, QaPair};
use crate::rag::{bounded_call, prompts};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct DocumentOps {
    manager: Arc<DocumentContextManager>,
    generator: Arc<dyn GenerationProvider>,
    generation_timeout: Duration,
}

impl DocumentOps {
    pub fn new(
        manager: Arc<DocumentContextManager>,
        generator: Arc<dyn GenerationProvider>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            manager,
            generator,
            generation_timeout,
        }
    }

    /// Full-document context plus a generation call under the usual bounds
    async fn generate_over_document(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, KbError> {
        let active = self.manager.require_active().await?;
        // An empty chunk set yields empty context; whether that produces a
        // trivial summary or an error is the provider's call.
        let context = active.chunks.full_text();

        bounded_call(
            "generation",
            self.generation_timeout,
            cancel,
            async { self.generator.generate(prompt, &context).await },
            KbError::Generation,
        )
        .await
    }

    /// Summarize the active document; returns the provider's prose verbatim
    pub async fn summarize(&self, cancel: &CancellationToken) -> Result<String, KbError> {
        self.generate_over_document(prompts::SUMMARY, cancel).await
    }

    /// Extract the document's key concepts as a list of short strings
    pub async fn key_concepts(&self, cancel: &CancellationToken) -> Result<Vec<String>, KbError> {
        let raw = self
            .generate_over_document(prompts::KEY_CONCEPTS, cancel)
            .await?;
        parse::string_list(&raw)
    }

    /// Generate exam-style question/answer pairs over the whole document
    pub async fn generate_qa(&self, cancel: &CancellationToken) -> Result<Vec<QaPair>, KbError> {
        let raw = self
            .generate_over_document(prompts::GENERATE_QA, cancel)
            .await?;
        parse::qa_pairs(&raw)
    }

    /// Generate flashcard-style question/answer pairs
    pub async fn flashcards(&self, cancel: &CancellationToken) -> Result<Vec<QaPair>, KbError> {
        let raw = self
            .generate_over_document(prompts::FLASHCARDS, cancel)
            .await?;
        parse::qa_pairs(&raw)
    }
}
