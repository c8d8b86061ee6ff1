//! Database schema and migrations for DocFlow.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have already run.

/// Database migrations.
///
/// Each entry is a SQL script executed inside its own transaction.
pub const MIGRATIONS: &[&str] = &[
    // v1: owning principals
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: uploaded documents
    r#"
CREATE TABLE documents (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id        INTEGER NOT NULL REFERENCES users(id),
    stored_name     TEXT NOT NULL,
    storage_path    TEXT NOT NULL,
    size_bytes      INTEGER NOT NULL CHECK (size_bytes >= 0),
    declared_type   TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'uploaded'
                    CHECK (status IN ('uploaded', 'processing', 'completed', 'failed')),
    created_at      TEXT NOT NULL,
    processed_at    TEXT
);

CREATE INDEX idx_documents_owner ON documents(owner_id);
CREATE INDEX idx_documents_owner_status ON documents(owner_id, status);
"#,
];
