//! File-based storage implementation.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Result, VerityError};
use crate::storage::traits::{Storage, StorageError, check_name};

/// A storage backend rooted at a directory.
///
/// The directory is created on first write, so constructing a storage for a
/// path that does not exist yet is cheap and side-effect free.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Whether to fsync blobs before they are renamed into place.
    sync_writes: bool,
}

impl FileStorage {
    /// Create a new file storage in the given directory.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        FileStorage {
            directory: directory.as_ref().to_path_buf(),
            sync_writes: true,
        }
    }

    /// Enable or disable fsync on write.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// The root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the full path for a file name.
    fn file_path(&self, name: &str) -> std::result::Result<PathBuf, StorageError> {
        check_name(name)?;
        Ok(self.directory.join(name))
    }

    fn ensure_directory(&self) -> Result<()> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).map_err(|e| {
                VerityError::storage(format!(
                    "Failed to create directory {}: {e}",
                    self.directory.display()
                ))
            })?;
        }

        if !self.directory.is_dir() {
            return Err(VerityError::storage(format!(
                "Path is not a directory: {}",
                self.directory.display()
            )));
        }
        Ok(())
    }
}

fn map_io_error(name: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::FileNotFound(name.to_string()),
        ErrorKind::PermissionDenied => StorageError::PermissionDenied(name.to_string()),
        _ => StorageError::IoError(format!("{name}: {e}")),
    }
}

impl Storage for FileStorage {
    fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(name)?;
        Ok(fs::read(&path).map_err(|e| map_io_error(name, e))?)
    }

    fn write_all(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(name)?;
        self.ensure_directory()?;

        // Write to a sibling temp file, then rename over the target.
        let temp_path = self.directory.join(format!(".{name}.tmp"));
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(data)?;
            if self.sync_writes {
                file.sync_all()?;
            }
            fs::rename(&temp_path, &path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&temp_path);
            return Err(map_io_error(name, e).into());
        }

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.file_path(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.file_path(name)?;
        Ok(fs::remove_file(&path).map_err(|e| map_io_error(name, e))?)
    }

    fn list_files(&self) -> Result<Vec<String>> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_creates_directory_on_write() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("models").join("saved");
        let storage = FileStorage::new(&root);

        assert!(!root.exists());
        assert!(storage.list_files().unwrap().is_empty());

        storage.write_all("classifier.bin", b"weights").unwrap();
        assert!(root.is_dir());
        assert!(storage.exists("classifier.bin"));
        assert_eq!(storage.read_all("classifier.bin").unwrap(), b"weights");
    }

    #[test]
    fn test_list_skips_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).with_sync_writes(false);

        storage.write_all("b.bin", b"2").unwrap();
        storage.write_all("a.bin", b"1").unwrap();
        fs::write(temp_dir.path().join(".c.bin.tmp"), b"partial").unwrap();

        assert_eq!(storage.list_files().unwrap(), vec!["a.bin", "b.bin"]);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let err = storage.read_all("missing.bin").unwrap_err();
        assert!(err.to_string().contains("File not found: missing.bin"));
        assert!(storage.delete("missing.bin").is_err());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(storage.write_all("../escape.bin", b"x").is_err());
        assert!(!storage.exists("../escape.bin"));
    }
}
