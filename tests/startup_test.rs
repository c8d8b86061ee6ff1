//! Startup Tests
//!
//! Configuration, database reopening and the staging sweep.

use std::io::Cursor;

use tempfile::TempDir;

use docflow::document::{DocumentService, FileStore, LocalFileStore, Upload, STAGING_PREFIX};
use docflow::{Config, Database, NewUser, UserRepository};

#[test]
fn test_config_file_drives_limits() {
    let config = Config::parse(
        r#"
[database]
path = "var/db.sqlite"

[storage]
root = "var/uploads"
max_upload_size = 2048
"#,
    )
    .unwrap();

    assert_eq!(config.database.path, "var/db.sqlite");
    assert_eq!(config.storage.root, "var/uploads");
    assert_eq!(config.storage.max_upload_size, 2048);
    assert_eq!(config.logging.level, "info");
    config.validate().unwrap();
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("data").join("docflow.db");
    let store = LocalFileStore::new(temp_dir.path().join("uploads")).unwrap();

    let (owner, doc_id) = {
        let db = Database::open(&db_path).await.unwrap();
        let owner = UserRepository::new(db.pool())
            .create(&NewUser::new("carol", "carol@example.com"))
            .await
            .unwrap()
            .id;
        let mut upload = Upload::new("notes.doc", "application/msword", Cursor::new(b"DOC".to_vec()));
        let doc = DocumentService::new(&db, &store)
            .upload(owner, &mut upload)
            .await
            .unwrap();
        db.close().await;
        (owner, doc.id)
    };

    let db = Database::open(&db_path).await.unwrap();
    let download = DocumentService::new(&db, &store)
        .download(owner, doc_id)
        .await
        .unwrap();
    assert_eq!(download.content, b"DOC");
}

#[tokio::test]
async fn test_staging_sweep_keeps_published_files() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalFileStore::new(temp_dir.path().join("uploads")).unwrap();
    let db = Database::open_in_memory().await.unwrap();
    let owner = UserRepository::new(db.pool())
        .create(&NewUser::new("dave", "dave@example.com"))
        .await
        .unwrap()
        .id;

    let mut upload = Upload::new("a.pdf", "application/pdf", Cursor::new(b"pdf".to_vec()));
    let doc = DocumentService::new(&db, &store)
        .upload(owner, &mut upload)
        .await
        .unwrap();

    // Leftover from a crash mid-write.
    let leftover = store
        .owner_dir(owner)
        .join(format!("{STAGING_PREFIX}abandoned.part"));
    std::fs::write(&leftover, b"partial").unwrap();

    assert_eq!(store.purge_staging().unwrap(), 1);
    assert!(!leftover.exists());
    assert!(std::path::Path::new(&doc.storage_path).exists());
}
