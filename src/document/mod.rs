//! Document ingestion for DocFlow.
//!
//! This module turns untrusted uploads into stored files with metadata records:
//! - Size and declared-type validation
//! - Filename sanitizing and timestamped stored names
//! - Owner-scoped storage on the local filesystem
//! - Document records with compensation on failure

mod error;
mod metadata;
mod naming;
mod pipeline;
mod service;
mod storage;
mod validate;

pub use error::IngestError;
pub use metadata::{DocumentRepository, DocumentStatus, NewDocument, UploadedDocument};
pub use naming::{
    disambiguate, sanitize_filename, split_extension, unique_name, FALLBACK_NAME, PLACEHOLDER,
    TIMESTAMP_FORMAT,
};
pub use pipeline::{IngestionPipeline, Upload};
pub use service::{DocumentService, DownloadResult};
pub use storage::{
    FileStore, LocalFileStore, StoredFile, MAX_NAME_ATTEMPTS, STAGING_PREFIX, STAGING_SUFFIX,
};
pub use validate::{
    allowed_types_description, check_declared_type, measure_size, required_extension,
    ALLOWED_TYPES,
};

/// Maximum length of a sanitized filename in bytes.
pub const MAX_STORED_NAME_LENGTH: usize = 80;

/// Default maximum upload size in bytes (10MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;
