//! Document service for DocFlow.
//!
//! This module provides the owner-facing document operations:
//! - Upload through the ingestion pipeline
//! - Lookup, listing and download scoped to the owner
//! - Deletion of record and file

use std::io::{Read, Seek};
use std::path::Path;

use tracing::{error, info};

use crate::db::Database;
use crate::{DocflowError, Result};

use super::error::IngestError;
use super::metadata::{DocumentRepository, DocumentStatus, UploadedDocument};
use super::pipeline::{IngestionPipeline, Upload};
use super::storage::FileStore;
use super::DEFAULT_MAX_UPLOAD_SIZE;

/// Result of a document download.
#[derive(Debug)]
pub struct DownloadResult {
    /// Document record.
    pub document: UploadedDocument,
    /// Stored bytes.
    pub content: Vec<u8>,
}

/// Document service for managing an owner's documents.
pub struct DocumentService<'a, S: FileStore + ?Sized> {
    db: &'a Database,
    store: &'a S,
    max_upload_size: u64,
}

impl<'a, S: FileStore + ?Sized> DocumentService<'a, S> {
    /// Create a new DocumentService.
    pub fn new(db: &'a Database, store: &'a S) -> Self {
        Self {
            db,
            store,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Create a new DocumentService with a custom max upload size.
    pub fn with_max_upload_size(mut self, max_size: u64) -> Self {
        self.max_upload_size = max_size;
        self
    }

    fn repo(&self) -> DocumentRepository<'_> {
        DocumentRepository::new(self.db.pool())
    }

    /// Upload a document on behalf of `owner_id`.
    pub async fn upload<R: Read + Seek>(
        &self,
        owner_id: i64,
        upload: &mut Upload<R>,
    ) -> std::result::Result<UploadedDocument, IngestError> {
        IngestionPipeline::new(self.db.pool(), self.store)
            .with_max_upload_size(self.max_upload_size)
            .ingest(owner_id, upload)
            .await
    }

    /// Get a document. Another owner's document is reported as not found.
    pub async fn get(&self, owner_id: i64, id: i64) -> Result<UploadedDocument> {
        self.repo()
            .find(owner_id, id)
            .await?
            .ok_or_else(|| DocflowError::NotFound("document".to_string()))
    }

    /// List an owner's documents, newest first.
    pub async fn list(
        &self,
        owner_id: i64,
        status: Option<DocumentStatus>,
    ) -> Result<Vec<UploadedDocument>> {
        self.repo().list_by_owner(owner_id, status).await
    }

    /// Download a document together with its stored bytes.
    pub async fn download(&self, owner_id: i64, id: i64) -> Result<DownloadResult> {
        let document = self.get(owner_id, id).await?;
        let content = self.store.read_file(Path::new(&document.storage_path))?;
        Ok(DownloadResult { document, content })
    }

    /// Delete a document.
    ///
    /// The record goes first, so an interruption leaves at worst an
    /// unreferenced file. A file that is already gone is not an error.
    ///
    /// # Returns
    /// The deleted record.
    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<UploadedDocument> {
        let document = self.get(owner_id, id).await?;

        if !self.repo().delete(owner_id, id).await? {
            // Removed concurrently between lookup and delete.
            return Err(DocflowError::NotFound("document".to_string()));
        }

        let path = Path::new(&document.storage_path);
        match self.store.delete_file(path) {
            Ok(removed) => {
                info!(
                    owner_id,
                    document_id = id,
                    stored_name = %document.stored_name,
                    file_removed = removed,
                    "Document deleted"
                );
                Ok(document)
            }
            Err(e) => {
                error!(
                    "Document {} record deleted but file {:?} remains: {}",
                    id, path, e
                );
                Err(DocflowError::Io(e))
            }
        }
    }
}
