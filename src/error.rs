//! Error types for the Verity library.
//!
//! All fallible operations return [`VerityError`] through the crate-wide
//! [`Result`] alias. The variants mirror the lifecycle of a classifier:
//! input validation, fitting, training, persistence and configuration.
//!
//! # Examples
//!
//! ```
//! use verity::error::{Result, VerityError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(VerityError::validation("text is too short"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Verity operations.
#[derive(Error, Debug)]
pub enum VerityError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input text failed length or content checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// A component was used before it was fitted
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Prediction was requested before any successful train or load
    #[error("Model not trained yet")]
    NotTrained,

    /// Training labels do not contain both classes
    #[error("Insufficient classes: need 2 distinct labels, got {found}")]
    InsufficientClasses { found: usize },

    /// The training corpus is empty or produced no terms
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// A persisted model blob is missing
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// A persisted model blob could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Dataset rows are malformed
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with VerityError.
pub type Result<T> = std::result::Result<T, VerityError>;

impl VerityError {
    /// Create a new validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        VerityError::Validation(msg.into())
    }

    /// Create a new not-fitted error.
    pub fn not_fitted<S: Into<String>>(component: S) -> Self {
        VerityError::NotFitted(component.into())
    }

    /// Create a new empty corpus error.
    pub fn empty_corpus<S: Into<String>>(msg: S) -> Self {
        VerityError::EmptyCorpus(msg.into())
    }

    /// Create a new model not found error.
    pub fn model_not_found<S: Into<String>>(name: S) -> Self {
        VerityError::ModelNotFound(name.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        VerityError::Serialization(msg.into())
    }

    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        VerityError::Dataset(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        VerityError::InvalidConfig(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        VerityError::Analysis(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        VerityError::Storage(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        VerityError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        VerityError::Other(msg.into())
    }

    /// Whether the caller can recover by training (or retraining) a model.
    pub fn is_recoverable_by_training(&self) -> bool {
        matches!(
            self,
            VerityError::NotTrained | VerityError::NotFitted(_) | VerityError::ModelNotFound(_)
        )
    }
}
