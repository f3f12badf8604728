// Context manager state machine: activation, persistence, recovery

use super::support::*;
use document_qa_core::{Chunk, DocumentContextManager};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_require_active_fails_before_any_activation() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager(dir.path());

    let err = mgr.require_active().await.unwrap_err();
    assert_eq!(err.error_code(), "NO_ACTIVE_DOCUMENT");
    assert!(mgr.active_document_id().await.is_none());
}

#[tokio::test]
async fn test_upload_then_reload_reproduces_chunks() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mgr = manager(dir.path());
        mgr.activate_from_upload("doc-a", scenario_chunks())
            .await
            .unwrap();
    }

    // Fresh manager, same data dir: simulates a process restart
    let mgr = manager(dir.path());
    mgr.activate_from_storage("doc-a").await.unwrap();

    let active = mgr.require_active().await.unwrap();
    assert_eq!(active.document_id, "doc-a");

    let texts: Vec<&str> = active.chunks.texts().collect();
    assert_eq!(texts, vec!["alpha intro", "beta detail", "gamma conclusion"]);
    assert_eq!(active.chunks.get(1).unwrap().metadata, json!({"page": 2}));
    assert_eq!(active.index.len(), 3);
}

#[tokio::test]
async fn test_reactivating_active_id_touches_no_storage() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager(dir.path());

    mgr.activate_from_upload("doc-a", scenario_chunks())
        .await
        .unwrap();

    // Destroy the durable record. If re-activation touched storage in any
    // way it would now fail; the no-op path must not notice.
    std::fs::remove_dir_all(dir.path().join("doc-a")).unwrap();

    mgr.activate_from_storage("doc-a").await.unwrap();

    let active = mgr.require_active().await.unwrap();
    assert_eq!(active.document_id, "doc-a");
    assert_eq!(active.chunks.len(), 3);
}

#[tokio::test]
async fn test_switching_documents_keeps_previous_record_durable() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager(dir.path());

    mgr.activate_from_upload("doc-a", scenario_chunks())
        .await
        .unwrap();
    mgr.activate_from_upload(
        "doc-b",
        vec![Chunk::new("entirely different content", json!({}))],
    )
    .await
    .unwrap();

    assert_eq!(mgr.active_document_id().await.as_deref(), Some("doc-b"));

    // A's in-memory state was discarded but its record survived the swap
    mgr.activate_from_storage("doc-a").await.unwrap();
    let active = mgr.require_active().await.unwrap();
    assert_eq!(active.document_id, "doc-a");
    let texts: Vec<&str> = active.chunks.texts().collect();
    assert_eq!(texts, vec!["alpha intro", "beta detail", "gamma conclusion"]);
}

#[tokio::test]
async fn test_embedding_failure_leaves_no_durable_record() {
    let dir = tempfile::tempdir().unwrap();
    let mgr =
        DocumentContextManager::new(dir.path(), Arc::new(FailingEmbedder { dimension: 64 }));

    let err = mgr
        .activate_from_upload("doc-x", scenario_chunks())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "EMBEDDING_FAILED");

    // ActiveContext unchanged, nothing written for the id
    assert!(mgr.active_document_id().await.is_none());
    assert!(!dir.path().join("doc-x").exists());
}

#[tokio::test]
async fn test_storage_failure_leaves_context_unchanged() {
    let dir = tempfile::tempdir().unwrap();

    // A file where the data dir should be makes every persist call fail
    let data_dir = dir.path().join("blocked");
    std::fs::write(&data_dir, b"not a directory").unwrap();

    let mgr = manager(&data_dir);
    let err = mgr
        .activate_from_upload("doc-x", scenario_chunks())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STORAGE_FAILED");
    assert!(mgr.active_document_id().await.is_none());
}

#[tokio::test]
async fn test_failed_load_keeps_previous_document_active() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager(dir.path());

    mgr.activate_from_upload("doc-a", scenario_chunks())
        .await
        .unwrap();

    let err = mgr.activate_from_storage("missing-doc").await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    // doc-a survived the failed activation
    let active = mgr.require_active().await.unwrap();
    assert_eq!(active.document_id, "doc-a");
}

#[tokio::test]
async fn test_record_without_manifest_is_absent() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mgr = manager(dir.path());
        mgr.activate_from_upload("doc-a", scenario_chunks())
            .await
            .unwrap();
    }

    // Remove the commit marker; chunks.json and index.json stay behind
    std::fs::remove_file(dir.path().join("doc-a").join("manifest.json")).unwrap();

    let mgr = manager(dir.path());
    let err = mgr.activate_from_storage("doc-a").await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_record_with_missing_artifact_is_absent() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mgr = manager(dir.path());
        mgr.activate_from_upload("doc-a", scenario_chunks())
            .await
            .unwrap();
    }

    std::fs::remove_file(dir.path().join("doc-a").join("index.json")).unwrap();

    let mgr = manager(dir.path());
    let err = mgr.activate_from_storage("doc-a").await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_corrupt_index_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mgr = manager(dir.path());
        mgr.activate_from_upload("doc-a", scenario_chunks())
            .await
            .unwrap();
    }

    std::fs::write(dir.path().join("doc-a").join("index.json"), b"{ trunca").unwrap();

    let mgr = manager(dir.path());
    let err = mgr.activate_from_storage("doc-a").await.unwrap_err();
    assert_eq!(err.error_code(), "STORAGE_FAILED");
    assert!(mgr.active_document_id().await.is_none());
}

#[tokio::test]
async fn test_mismatched_embedder_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mgr = manager(dir.path());
        mgr.activate_from_upload("doc-a", scenario_chunks())
            .await
            .unwrap();
    }

    // Same data dir, different embedding parameters: the persisted index is
    // meaningless for this provider and must not load silently.
    let mgr = DocumentContextManager::new(dir.path(), test_embedder_with_dimension(32));
    let err = mgr.activate_from_storage("doc-a").await.unwrap_err();
    assert_eq!(err.error_code(), "STORAGE_FAILED");
    assert!(err.to_string().contains("provider mismatch") || err.to_string().contains("mismatch"));
}

#[tokio::test]
async fn test_reupload_replaces_record_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager(dir.path());

    mgr.activate_from_upload("doc-a", scenario_chunks())
        .await
        .unwrap();
    mgr.activate_from_upload("doc-a", vec![Chunk::new("replacement text", json!({}))])
        .await
        .unwrap();

    let active = mgr.require_active().await.unwrap();
    assert_eq!(active.chunks.len(), 1);

    // The replacement is what survives a reload
    let mgr2 = manager(dir.path());
    mgr2.activate_from_storage("doc-a").await.unwrap();
    let reloaded = mgr2.require_active().await.unwrap();
    let texts: Vec<&str> = reloaded.chunks.texts().collect();
    assert_eq!(texts, vec!["replacement text"]);
}

#[tokio::test]
async fn test_empty_chunk_set_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager(dir.path());

    mgr.activate_from_upload("doc-empty", Vec::new()).await.unwrap();

    let mgr2 = manager(dir.path());
    mgr2.activate_from_storage("doc-empty").await.unwrap();
    let active = mgr2.require_active().await.unwrap();
    assert!(active.chunks.is_empty());
    assert!(active.index.is_empty());
}
