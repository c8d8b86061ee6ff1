//! Deletion and Ownership Tests

mod common;

use std::path::Path;

use common::{upload, TestEnv};
use docflow::document::DocumentStatus;
use docflow::DocflowError;

#[tokio::test]
async fn test_delete_own_document() {
    let env = TestEnv::new().await;
    let service = env.service();
    let doc = service
        .upload(env.alice, &mut upload("a.pdf", "application/pdf", b"bytes"))
        .await
        .unwrap();

    let deleted = service.delete(env.alice, doc.id).await.unwrap();

    assert_eq!(deleted.id, doc.id);
    assert!(!Path::new(&doc.storage_path).exists());
    assert_eq!(env.record_count().await, 0);
}

#[tokio::test]
async fn test_foreign_document_is_not_found() {
    let env = TestEnv::new().await;
    let service = env.service();
    let doc = service
        .upload(env.alice, &mut upload("a.pdf", "application/pdf", b"bytes"))
        .await
        .unwrap();

    assert!(matches!(
        service.get(env.bob, doc.id).await,
        Err(DocflowError::NotFound(_))
    ));
    assert!(matches!(
        service.delete(env.bob, doc.id).await,
        Err(DocflowError::NotFound(_))
    ));

    // Same answer as for an id that never existed.
    let missing = service.delete(env.bob, doc.id + 1000).await.unwrap_err();
    let foreign = service.delete(env.bob, doc.id).await.unwrap_err();
    assert_eq!(missing.to_string(), foreign.to_string());

    assert!(Path::new(&doc.storage_path).exists());
    assert_eq!(env.record_count().await, 1);
}

#[tokio::test]
async fn test_delete_twice() {
    let env = TestEnv::new().await;
    let service = env.service();
    let doc = service
        .upload(env.alice, &mut upload("a.pdf", "application/pdf", b"bytes"))
        .await
        .unwrap();

    service.delete(env.alice, doc.id).await.unwrap();

    assert!(matches!(
        service.delete(env.alice, doc.id).await,
        Err(DocflowError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_when_file_already_gone() {
    let env = TestEnv::new().await;
    let service = env.service();
    let doc = service
        .upload(env.alice, &mut upload("a.pdf", "application/pdf", b"bytes"))
        .await
        .unwrap();
    std::fs::remove_file(&doc.storage_path).unwrap();

    service.delete(env.alice, doc.id).await.unwrap();

    assert_eq!(env.record_count().await, 0);
}

#[tokio::test]
async fn test_delete_keeps_other_documents() {
    let env = TestEnv::new().await;
    let service = env.service();
    let keep = service
        .upload(env.alice, &mut upload("keep.pdf", "application/pdf", b"keep"))
        .await
        .unwrap();
    let gone = service
        .upload(env.alice, &mut upload("gone.pdf", "application/pdf", b"gone"))
        .await
        .unwrap();

    service.delete(env.alice, gone.id).await.unwrap();

    let remaining = service.list(env.alice, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
    assert_eq!(remaining[0].status, DocumentStatus::Uploaded);
    assert_eq!(env.stored_files(), vec![Path::new(&keep.storage_path).to_path_buf()]);
}
