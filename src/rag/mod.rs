// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval-augmented generation over the active document
//!
//! Two query paths share the active-document snapshot from the context
//! manager:
//!
//! - [`query::RagQueryService`] answers questions from the top-k most
//!   similar chunks.
//! - [`document_ops::DocumentOps`] runs whole-document operations (summary,
//!   key concepts, Q&A pairs, flashcards) over the full chunk sequence and
//!   parses the provider's structured output strictly.
//!
//! [`service::DocumentQaService`] is the facade the surrounding application
//! talks to.

pub mod document_ops;
pub mod parse;
pub mod prompts;
pub mod query;
pub mod service;

pub use document_ops::DocumentOps;
pub use parse::QaPair;
pub use query::{RagQueryService, RetrievedChunk};
pub use service::DocumentQaService;

use crate::errors::KbError;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Run a provider call under a time budget and a cancellation signal
///
/// Cancellation aborts the in-flight call with `Cancelled`; budget expiry is
/// mapped through `on_timeout` so embedding and generation timeouts surface
/// as the respective provider error. Only queries pass real tokens here —
/// activations run to completion or roll back.
pub(crate) async fn bounded_call<T, F>(
    what: &str,
    budget: Duration,
    cancel: &CancellationToken,
    call: F,
    on_timeout: fn(String) -> KbError,
) -> Result<T, KbError>
where
    F: Future<Output = Result<T, KbError>>,
{
    tokio::select! {
        // Check cancellation first so an abandoned request never races a
        // provider call that happens to be ready.
        biased;
        _ = cancel.cancelled() => Err(KbError::Cancelled),
        result = timeout(budget, call) => match result {
            Ok(inner) => inner,
            Err(_) => Err(on_timeout(format!(
                "{} call timed out after {}s",
                what,
                budget.as_secs()
            ))),
        }
    }
}
