// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation provider interface
//!
//! The external text-generation capability consumed by the RAG services.
//! Given an instruction prompt and the context text assembled from document
//! chunks, it returns generated text. Failures are opaque to this core and
//! surface as [`KbError::Generation`]; no retries happen at this layer.

use crate::errors::KbError;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text for `prompt` grounded in `context`
    ///
    /// The context is the retrieved (or full-document) chunk text; how it is
    /// combined with the prompt is up to the provider. The returned text is
    /// passed back to callers verbatim.
    async fn generate(&self, prompt: &str, context: &str) -> Result<String, KbError>;
}
