//! Test helpers for integration tests.
//!
//! Provides a throwaway storage root, an in-memory database with seeded
//! owners, and helpers for inspecting what ended up on disk.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use docflow::document::{DocumentService, LocalFileStore, Upload};
use docflow::{Database, NewUser, UserRepository};

/// Test environment with storage, database and two owners.
pub struct TestEnv {
    /// Keeps the storage root alive for the duration of the test.
    pub temp_dir: TempDir,
    pub db: Database,
    pub store: LocalFileStore,
    pub alice: i64,
    pub bob: i64,
}

impl TestEnv {
    /// Create a fresh environment.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path().join("uploads")).unwrap();
        let db = Database::open_in_memory().await.unwrap();

        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice", "alice@example.com"))
            .await
            .unwrap()
            .id;
        let bob = users
            .create(&NewUser::new("bob", "bob@example.com"))
            .await
            .unwrap()
            .id;

        Self {
            temp_dir,
            db,
            store,
            alice,
            bob,
        }
    }

    /// Service with the default limit.
    pub fn service(&self) -> DocumentService<'_, LocalFileStore> {
        DocumentService::new(&self.db, &self.store)
    }

    /// Storage root.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Number of document records across all owners.
    pub async fn record_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    /// Every regular file under the storage root.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_files(self.root(), &mut files);
        files.sort();
        files
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files);
        } else {
            files.push(path);
        }
    }
}

/// Build an in-memory upload.
pub fn upload(filename: &str, declared_type: &str, content: &[u8]) -> Upload<Cursor<Vec<u8>>> {
    Upload::new(filename, declared_type, Cursor::new(content.to_vec()))
}
