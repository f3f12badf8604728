// Whole-document operations: summary, key concepts, Q&A pairs, flashcards

use super::support::*;
use document_qa_core::{Chunk, KbError};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_summary_uses_full_document_in_sequence_order() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("A short summary.");
    let service = service(dir.path(), generator.clone());

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    let summary = service.summary(&cancel).await.unwrap();
    assert_eq!(summary, "A short summary.");

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].context,
        "alpha intro\n\nbeta detail\n\ngamma conclusion"
    );
}

#[tokio::test]
async fn test_operations_use_distinct_prompts() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("[]");
    let service = service(dir.path(), generator.clone());

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    service.key_concepts(&cancel).await.unwrap();
    service.generate_qa(&cancel).await.unwrap();
    service.flashcards(&cancel).await.unwrap();

    let prompts: Vec<String> = generator.calls().into_iter().map(|c| c.prompt).collect();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("concepts"));
    assert!(prompts[1].contains("questions"));
    assert!(prompts[2].contains("flashcards"));
    assert_ne!(prompts[0], prompts[1]);
    assert_ne!(prompts[1], prompts[2]);
}

#[tokio::test]
async fn test_summary_with_empty_chunk_set() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("");
    let service = service(dir.path(), generator.clone());

    service.upload("doc-empty", Vec::new()).await.unwrap();

    let cancel = CancellationToken::new();
    let summary = service.summary(&cancel).await.unwrap();
    assert_eq!(summary, "");

    // The provider was called with empty context, not skipped
    assert_eq!(generator.calls()[0].context, "");
}

#[tokio::test]
async fn test_summary_without_active_document() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path(), ScriptedGenerator::replying("unused"));

    let cancel = CancellationToken::new();
    let err = service.summary(&cancel).await.unwrap_err();
    assert_eq!(err.error_code(), "NO_ACTIVE_DOCUMENT");
}

#[tokio::test]
async fn test_key_concepts_parses_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying(r#"["retrieval", "chunking", "embeddings"]"#);
    let service = service(dir.path(), generator);

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    let concepts = service.key_concepts(&cancel).await.unwrap();
    assert_eq!(concepts, vec!["retrieval", "chunking", "embeddings"]);
}

#[tokio::test]
async fn test_key_concepts_accepts_fenced_json() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("```json\n[\"alpha\", \"beta\"]\n```");
    let service = service(dir.path(), generator);

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    let concepts = service.key_concepts(&cancel).await.unwrap();
    assert_eq!(concepts, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_key_concepts_malformed_output_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("Sure! The key concepts are retrieval and chunking.");
    let service = service(dir.path(), generator);

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    let err = service.key_concepts(&cancel).await.unwrap_err();
    match err {
        KbError::GenerationFormat { raw, .. } => {
            assert!(raw.contains("Sure!"));
        }
        other => panic!("expected GenerationFormat, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_qa_parses_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying(
        r#"[{"question": "What comes first?", "answer": "The alpha intro."},
            {"question": "What closes the document?", "answer": "The gamma conclusion."}]"#,
    );
    let service = service(dir.path(), generator);

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    let pairs = service.generate_qa(&cancel).await.unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].question, "What comes first?");
    assert_eq!(pairs[1].answer, "The gamma conclusion.");
}

#[tokio::test]
async fn test_flashcards_malformed_pairs_are_format_error() {
    let dir = tempfile::tempdir().unwrap();
    // Element missing the "answer" field
    let generator = ScriptedGenerator::replying(r#"[{"question": "Orphaned question"}]"#);
    let service = service(dir.path(), generator);

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    let err = service.flashcards(&cancel).await.unwrap_err();
    assert_eq!(err.error_code(), "GENERATION_FORMAT");
}

#[tokio::test]
async fn test_flashcards_empty_array_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("[]");
    let service = service(dir.path(), generator);

    service
        .upload("doc-a", vec![Chunk::new("single chunk", json!({}))])
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let cards = service.flashcards(&cancel).await.unwrap();
    assert!(cards.is_empty());
}

#[tokio::test]
async fn test_ops_propagate_generation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::new(GeneratorBehavior::Fail("overloaded".to_string()));
    let service = service(dir.path(), generator);

    service.upload("doc-a", scenario_chunks()).await.unwrap();

    let cancel = CancellationToken::new();
    let err = service.generate_qa(&cancel).await.unwrap_err();
    assert_eq!(err.error_code(), "GENERATION_FAILED");
}
