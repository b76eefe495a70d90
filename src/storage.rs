//! Storage abstraction layer for Verity.
//!
//! Persisted models are a handful of named byte blobs. The [`Storage`] trait
//! hides where those blobs live so the persistence code can be exercised
//! against memory in tests and against a directory in production.
//!
//! # Example
//!
//! ```
//! use verity::storage::{MemoryStorage, Storage};
//!
//! # fn main() -> verity::error::Result<()> {
//! let storage = MemoryStorage::new();
//! storage.write_all("vectorizer.bin", b"bytes")?;
//! assert!(storage.exists("vectorizer.bin"));
//! assert_eq!(storage.read_all("vectorizer.bin")?, b"bytes");
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageError};
