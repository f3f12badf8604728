// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Strict parsing of structured generation output
//!
//! Provider output is untrusted external input. The only tolerance applied
//! here is stripping a markdown code fence around the payload, which models
//! add routinely; after that the payload must parse into exactly the
//! expected shape or the whole operation fails with `GenerationFormat` —
//! never a silent empty list. A well-formed empty array is accepted: it is a
//! valid provider answer, distinct from a parse failure.

use crate::errors::KbError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A question/answer pair, used for both generated Q&A and flashcards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Parse provider output into a list of concept strings
pub fn string_list(raw: &str) -> Result<Vec<String>, KbError> {
    let payload = strip_code_fence(raw);
    serde_json::from_str::<Vec<String>>(payload).map_err(|e| KbError::GenerationFormat {
        reason: format!("expected a JSON array of strings: {}", e),
        raw: raw.to_string(),
    })
}

/// Parse provider output into question/answer pairs
pub fn qa_pairs(raw: &str) -> Result<Vec<QaPair>, KbError> {
    let payload = strip_code_fence(raw);
    serde_json::from_str::<Vec<QaPair>>(payload).map_err(|e| KbError::GenerationFormat {
        reason: format!(
            "expected a JSON array of {{question, answer}} objects: {}",
            e
        ),
        raw: raw.to_string(),
    })
}

/// Strip a single surrounding markdown code fence, if present
fn strip_code_fence(raw: &str) -> &str {
    // Static pattern, cannot fail to compile
    let fence = Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n?(.*?)\n?\s*```\s*$").unwrap();
    match fence.captures(raw) {
        Some(captures) => captures.get(1).map_or(raw.trim(), |m| m.as_str()),
        None => raw.trim(),
    }
}
