//! Failure kinds of the ingestion pipeline.

use std::io;

use thiserror::Error;

use super::validate::allowed_types_description;
use crate::DocflowError;

const MIB: u64 = 1024 * 1024;
const KIB: u64 = 1024;

/// Render a byte limit the way it is configured, e.g. `10MB` for 10 MiB.
pub(crate) fn describe_limit(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

fn describe_max(max: &u64) -> String {
    describe_limit(*max)
}

fn cleanup_note(cleanup: &Option<io::Error>) -> String {
    match cleanup {
        Some(e) => format!("; removing the stored file also failed: {e}"),
        None => String::new(),
    }
}

/// Why an upload was not ingested.
///
/// The first three variants are caused by the client and leave no trace on
/// disk or in the database. The rest are infrastructure failures.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The payload is larger than the configured maximum.
    #[error("File too large ({size} bytes). Maximum size is {}", describe_max(.max))]
    PayloadTooLarge {
        /// Measured payload size.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// The declared content type is not on the allow-list.
    #[error("File type '{declared}' not supported. Allowed types: {}", allowed_types_description())]
    UnsupportedMediaType {
        /// Content type asserted by the client.
        declared: String,
    },

    /// The filename extension disagrees with the declared content type.
    #[error("File extension '{actual}' doesn't match file type '{declared}'. Expected '{expected}'")]
    ExtensionMismatch {
        /// Content type asserted by the client.
        declared: String,
        /// Extension found on the submitted filename (lowercased, may be empty).
        actual: String,
        /// Extension required for the declared type.
        expected: &'static str,
    },

    /// The byte source could not be measured or rewound.
    #[error("Failed to read upload: {0}")]
    UnreadableSource(#[source] io::Error),

    /// Writing the bytes to storage failed.
    #[error("Failed to save file: {0}")]
    StorageWrite(#[source] io::Error),

    /// Inserting the metadata record failed.
    ///
    /// `cleanup` carries the error of the compensating file removal when that
    /// also failed, in which case the stored file may still be on disk.
    #[error("Failed to create document record: {source}{}", cleanup_note(.cleanup))]
    RecordCreation {
        /// Error returned by the metadata store.
        source: DocflowError,
        /// Error from removing the already written file, if any.
        cleanup: Option<io::Error>,
    },
}

impl IngestError {
    /// Whether the failure was caused by the request rather than the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::PayloadTooLarge { .. }
                | IngestError::UnsupportedMediaType { .. }
                | IngestError::ExtensionMismatch { .. }
        )
    }
}
