/*
    errors.rs - Error types for the file index subsystem
*/

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a file store implementation
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The file the operation targets is not present
    #[error("file not found: {}", path.display())]
    Missing { path: PathBuf },

    /// The supplied path cannot name a shared file
    #[error("invalid file path: {}", path.display())]
    InvalidPath { path: PathBuf },

    /// Underlying storage failure
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for file store operations
pub type FileStoreResult<T> = Result<T, FileStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error_display() {
        let err = FileStoreError::Missing { path: PathBuf::from("/tmp/ghost.txt") };
        assert_eq!(err.to_string(), "file not found: /tmp/ghost.txt");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: FileStoreError = io.into();
        assert!(matches!(err, FileStoreError::Io(_)));
    }
}
