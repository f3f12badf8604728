// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Operation prompts for the generation provider

/// Prompt for answering a question from retrieved context
pub fn answer(question: &str) -> String {
    format!(
        "Answer the question using only the provided document context. \
         If the context does not contain the answer, say that the document \
         does not cover it.\n\nQuestion: {}",
        question
    )
}

/// Prompt for a whole-document summary
pub const SUMMARY: &str = "Write a concise summary of the provided document. \
     Cover the main topic, the key points, and any conclusions. \
     Respond with plain prose, no headings.";

/// Prompt for key-concept extraction; response must be a JSON string array
pub const KEY_CONCEPTS: &str = "Identify the most important concepts in the \
     provided document. Respond with only a JSON array of short strings, \
     one per concept, most important first. No other text.";

/// Prompt for exam-style Q&A pairs; response must be a JSON array of
/// objects with "question" and "answer" fields
pub const GENERATE_QA: &str = "Write the most important questions a reader \
     should be able to answer after studying the provided document, with \
     their answers. Respond with only a JSON array of objects, each with a \
     \"question\" field and an \"answer\" field. No other text.";

/// Prompt for flashcards; same JSON shape as Q&A pairs but with short,
/// memorizable answers
pub const FLASHCARDS: &str = "Create flashcards for studying the provided \
     document. Each card has a prompt side and a short answer side suitable \
     for memorization. Respond with only a JSON array of objects, each with \
     a \"question\" field and an \"answer\" field. No other text.";
