//! DocFlow - document upload ingestion
//!
//! Validates uploaded documents, stores them in per-owner directories and
//! records their metadata in SQLite.

pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod logging;

pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use document::{
    DocumentService, DocumentStatus, FileStore, IngestError, IngestionPipeline, LocalFileStore,
    Upload, UploadedDocument,
};
pub use error::{DocflowError, Result};
