//! Document records and their repository.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::Result;

/// Processing state of a document.
///
/// Ingestion only ever produces [`DocumentStatus::Uploaded`]; the other
/// states belong to a later processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Stored and recorded, not yet picked up.
    #[default]
    Uploaded,
    /// Being processed.
    Processing,
    /// Processing finished.
    Completed,
    /// Processing gave up.
    Failed,
}

impl DocumentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [DocumentStatus; 4] = [
        DocumentStatus::Uploaded,
        DocumentStatus::Processing,
        DocumentStatus::Completed,
        DocumentStatus::Failed,
    ];

    /// Convert status to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploaded" => Ok(DocumentStatus::Uploaded),
            "processing" => Ok(DocumentStatus::Processing),
            "completed" => Ok(DocumentStatus::Completed),
            "failed" => Ok(DocumentStatus::Failed),
            _ => Err(format!("unknown document status: {s}")),
        }
    }
}

impl TryFrom<String> for DocumentStatus {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// A stored file together with its metadata.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UploadedDocument {
    /// Unique document ID.
    pub id: i64,
    /// User ID of the owner.
    pub owner_id: i64,
    /// Sanitized, de-collided filename on disk.
    pub stored_name: String,
    /// Full path of the stored bytes.
    pub storage_path: String,
    /// Measured size in bytes.
    pub size_bytes: i64,
    /// Content type asserted by the client.
    pub declared_type: String,
    /// Processing state.
    #[sqlx(try_from = "String")]
    pub status: DocumentStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When processing finished, if it has.
    pub processed_at: Option<DateTime<Utc>>,
}

/// Data for creating a new document record.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// User ID of the owner.
    pub owner_id: i64,
    /// Filename on disk.
    pub stored_name: String,
    /// Full path of the stored bytes.
    pub storage_path: String,
    /// Measured size in bytes.
    pub size_bytes: i64,
    /// Content type asserted by the client.
    pub declared_type: String,
}

const COLUMNS: &str = "id, owner_id, stored_name, storage_path, size_bytes, \
     declared_type, status, created_at, processed_at";

/// Repository for document records.
///
/// Lookups and deletes are always scoped to an owner; another owner's
/// document is indistinguishable from one that does not exist.
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    /// Create a new DocumentRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record with status `uploaded` and return it.
    ///
    /// The row is read back by the insert statement itself, so an `Err`
    /// always means nothing was stored.
    pub async fn insert(&self, doc: &NewDocument) -> Result<UploadedDocument> {
        let doc = sqlx::query_as::<_, UploadedDocument>(&format!(
            "INSERT INTO documents
                (owner_id, stored_name, storage_path, size_bytes, declared_type, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(doc.owner_id)
        .bind(&doc.stored_name)
        .bind(&doc.storage_path)
        .bind(doc.size_bytes)
        .bind(&doc.declared_type)
        .bind(DocumentStatus::Uploaded.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(doc)
    }

    /// Get a document by ID, if it belongs to `owner_id`.
    pub async fn find(&self, owner_id: i64, id: i64) -> Result<Option<UploadedDocument>> {
        let doc = sqlx::query_as::<_, UploadedDocument>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE id = ? AND owner_id = ?"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(doc)
    }

    /// List an owner's documents, newest first, optionally filtered by status.
    pub async fn list_by_owner(
        &self,
        owner_id: i64,
        status: Option<DocumentStatus>,
    ) -> Result<Vec<UploadedDocument>> {
        let status = status.map(|s| s.as_str());
        let docs = sqlx::query_as::<_, UploadedDocument>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE owner_id = ? AND (? IS NULL OR status = ?)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .bind(status)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(docs)
    }

    /// Delete a document by ID, if it belongs to `owner_id`.
    ///
    /// Returns `false` if no such document exists.
    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
