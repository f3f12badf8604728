// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the document knowledge base
//!
//! One typed error family for every core operation:
//! - Storage errors (missing records, unreadable/corrupt artifacts)
//! - Provider errors (embedding and generation failures, including timeouts)
//! - Format errors (generation output that cannot be parsed)
//! - Guard errors (queries issued with no active document)

use thiserror::Error;

/// Errors surfaced by knowledge-base operations
#[derive(Error, Debug)]
pub enum KbError {
    /// No durable record exists for the requested document id
    #[error("No document record found for id: {0}")]
    NotFound(String),

    /// A query was issued while no document is active
    #[error("No document knowledge base loaded. Upload or load a document first.")]
    NoActiveDocument,

    /// The embedding provider failed during index build or query
    #[error("Embedding provider failed: {0}")]
    Embedding(String),

    /// The generation provider failed during answer/summary/etc.
    #[error("Generation provider failed: {0}")]
    Generation(String),

    /// The generation provider succeeded but its output could not be parsed
    /// into the expected structure
    #[error("Generation output could not be parsed: {reason}")]
    GenerationFormat {
        reason: String,
        /// Raw provider output, kept so callers can log or inspect it
        raw: String,
    },

    /// Disk/persistence failure (I/O error, corrupt or inconsistent record)
    #[error("Storage failure: {0}")]
    Storage(String),

    /// The caller abandoned an in-flight query
    #[error("Operation cancelled by caller")]
    Cancelled,
}

impl From<std::io::Error> for KbError {
    fn from(err: std::io::Error) -> Self {
        KbError::Storage(err.to_string())
    }
}

impl KbError {
    /// Get error code for logging and metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            KbError::NotFound(_) => "NOT_FOUND",
            KbError::NoActiveDocument => "NO_ACTIVE_DOCUMENT",
            KbError::Embedding(_) => "EMBEDDING_FAILED",
            KbError::Generation(_) => "GENERATION_FAILED",
            KbError::GenerationFormat { .. } => "GENERATION_FORMAT",
            KbError::Storage(_) => "STORAGE_FAILED",
            KbError::Cancelled => "CANCELLED",
        }
    }

    /// Check if this error is retryable
    ///
    /// Provider failures are transient by nature (rate limits, timeouts);
    /// missing records and parse failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KbError::Embedding(_) | KbError::Generation(_))
    }
}
