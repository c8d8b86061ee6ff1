//! Error types for DocFlow.

use thiserror::Error;

/// Common error type for DocFlow.
#[derive(Error, Debug)]
pub enum DocflowError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DocflowError {
    fn from(e: sqlx::Error) -> Self {
        DocflowError::Database(e.to_string())
    }
}

/// Result type alias for DocFlow operations.
pub type Result<T> = std::result::Result<T, DocflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = DocflowError::NotFound("document".to_string());
        assert_eq!(err.to_string(), "document not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DocflowError = io_err.into();
        assert!(matches!(err, DocflowError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: DocflowError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DocflowError::Database(_)));
        assert!(err.to_string().starts_with("database error:"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(DocflowError::Config("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
