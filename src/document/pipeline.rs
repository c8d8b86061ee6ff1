//! The ingestion pipeline: validate, name, store, record.
//!
//! Stages run in a fixed order and the first failure ends the run:
//!
//! 1. size check against the configured maximum
//! 2. declared type against the allow-list and the filename extension
//! 3. filename sanitizing
//! 4. timestamped stored name
//! 5. write into the owner's directory
//! 6. metadata record, removing the written file again if the insert fails
//!
//! Nothing touches the disk before stage 5, so rejected requests leave no
//! trace. There are no retries.

use std::io::{self, Read, Seek};
use std::path::Path;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use super::error::IngestError;
use super::metadata::{DocumentRepository, NewDocument, UploadedDocument};
use super::naming::{sanitize_filename, unique_name};
use super::storage::{FileStore, StoredFile};
use super::validate::{check_declared_type, measure_size};
use super::DEFAULT_MAX_UPLOAD_SIZE;

/// An incoming file as received from the client.
#[derive(Debug)]
pub struct Upload<R> {
    /// Filename as submitted; untrusted.
    pub filename: String,
    /// Content type as submitted; untrusted.
    pub declared_type: String,
    /// The payload. Must be seekable so its size can be measured up front.
    pub source: R,
}

impl<R: Read + Seek> Upload<R> {
    /// Create a new upload.
    pub fn new(filename: impl Into<String>, declared_type: impl Into<String>, source: R) -> Self {
        Self {
            filename: filename.into(),
            declared_type: declared_type.into(),
            source,
        }
    }
}

/// Runs uploads through validation, storage and record creation.
pub struct IngestionPipeline<'a, S: FileStore + ?Sized> {
    pool: &'a SqlitePool,
    store: &'a S,
    max_upload_size: u64,
}

impl<'a, S: FileStore + ?Sized> IngestionPipeline<'a, S> {
    /// Create a pipeline with the default size limit.
    pub fn new(pool: &'a SqlitePool, store: &'a S) -> Self {
        Self {
            pool,
            store,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the maximum accepted payload size in bytes.
    pub fn with_max_upload_size(mut self, max_size: u64) -> Self {
        self.max_upload_size = max_size;
        self
    }

    /// Get the maximum accepted payload size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Ingest one upload on behalf of `owner_id`.
    ///
    /// On success the returned record has status `uploaded` and a file of
    /// exactly `size_bytes` exists at its `storage_path`.
    pub async fn ingest<R: Read + Seek>(
        &self,
        owner_id: i64,
        upload: &mut Upload<R>,
    ) -> Result<UploadedDocument, IngestError> {
        let size = measure_size(&mut upload.source, self.max_upload_size)
            .inspect_err(|e| warn!(owner_id, filename = %upload.filename, "Upload rejected: {e}"))?;

        check_declared_type(&upload.declared_type, &upload.filename)
            .inspect_err(|e| warn!(owner_id, filename = %upload.filename, "Upload rejected: {e}"))?;

        let size_bytes = size_column(size)?;

        let sanitized = sanitize_filename(&upload.filename);
        let stored_name = unique_name(&sanitized, Utc::now());
        debug!(owner_id, size, %stored_name, "Upload validated");

        let stored = self.store_bytes(owner_id, &stored_name, size, &mut upload.source)?;

        let new_doc = NewDocument {
            owner_id,
            stored_name: stored.stored_name.clone(),
            storage_path: stored.path.to_string_lossy().into_owned(),
            size_bytes,
            declared_type: upload.declared_type.clone(),
        };
        let doc = self.record(&new_doc, &stored.path).await?;

        info!(
            owner_id,
            document_id = doc.id,
            stored_name = %doc.stored_name,
            size_bytes = doc.size_bytes,
            "Document uploaded"
        );
        Ok(doc)
    }

    fn store_bytes(
        &self,
        owner_id: i64,
        stored_name: &str,
        expected_size: u64,
        source: &mut dyn Read,
    ) -> Result<StoredFile, IngestError> {
        let dir = self.store.owner_dir(owner_id);
        self.store
            .ensure_directory(&dir)
            .map_err(IngestError::StorageWrite)?;

        let stored = self
            .store
            .write_file(&dir, stored_name, source)
            .map_err(IngestError::StorageWrite)?;

        // The source changed length between measuring and copying.
        if stored.size != expected_size {
            if let Err(e) = self.store.delete_file(&stored.path) {
                error!("Failed to remove short write {:?}: {}", stored.path, e);
            }
            return Err(IngestError::StorageWrite(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "wrote {} bytes but the upload measured {} bytes",
                    stored.size, expected_size
                ),
            )));
        }

        Ok(stored)
    }

    /// Insert the record, or remove the stored file and report why not.
    async fn record(
        &self,
        new_doc: &NewDocument,
        path: &Path,
    ) -> Result<UploadedDocument, IngestError> {
        match DocumentRepository::new(self.pool).insert(new_doc).await {
            Ok(doc) => Ok(doc),
            Err(source) => {
                warn!(
                    owner_id = new_doc.owner_id,
                    stored_name = %new_doc.stored_name,
                    "Document record creation failed, removing stored file: {source}"
                );
                let cleanup = match self.store.delete_file(path) {
                    Ok(_) => None,
                    Err(e) => {
                        error!("Failed to remove {:?} after record failure: {}", path, e);
                        Some(e)
                    }
                };
                Err(IngestError::RecordCreation { source, cleanup })
            }
        }
    }
}

/// Convert a byte count to the signed integer column it is stored in.
fn size_column(size: u64) -> Result<i64, IngestError> {
    i64::try_from(size).map_err(|_| {
        IngestError::StorageWrite(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{size} bytes cannot be recorded"),
        ))
    })
}
