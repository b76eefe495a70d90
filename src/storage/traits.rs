//! Storage abstraction trait and common types.

use crate::error::{Result, VerityError};

/// A trait for storage backends holding named byte blobs.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read a whole blob.
    fn read_all(&self, name: &str) -> Result<Vec<u8>>;

    /// Replace a blob with `data`. Readers never observe a partial write.
    fn write_all(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Check if a blob exists.
    fn exists(&self, name: &str) -> bool;

    /// Delete a blob.
    fn delete(&self, name: &str) -> Result<()>;

    /// List all blob names, sorted.
    fn list_files(&self) -> Result<Vec<String>>;
}

/// Error types specific to storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// Permission denied.
    PermissionDenied(String),

    /// Name is empty or escapes the storage root.
    InvalidName(String),

    /// I/O error.
    IoError(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::PermissionDenied(name) => write!(f, "Permission denied: {name}"),
            StorageError::InvalidName(name) => write!(f, "Invalid file name: {name:?}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for VerityError {
    fn from(err: StorageError) -> Self {
        VerityError::storage(err.to_string())
    }
}

/// Reject names that are empty or could address something outside the root.
pub(crate) fn check_name(name: &str) -> std::result::Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        Err(StorageError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::FileNotFound("test.txt".to_string());
        assert_eq!(err.to_string(), "File not found: test.txt");

        let err = StorageError::PermissionDenied("test.txt".to_string());
        assert_eq!(err.to_string(), "Permission denied: test.txt");

        let err = StorageError::IoError("connection failed".to_string());
        assert_eq!(err.to_string(), "I/O error: connection failed");

        let err: VerityError = StorageError::InvalidName("../x".to_string()).into();
        assert_eq!(err.to_string(), "Storage error: Invalid file name: \"../x\"");
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("classifier.bin").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("..").is_err());
        assert!(check_name("../etc/passwd").is_err());
        assert!(check_name("a\\b").is_err());
    }
}
