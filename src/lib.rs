//! # Verity
//!
//! A fake news classifier built on TF-IDF features, for Rust.
//!
//! ## Features
//!
//! - Text normalization pipeline (URLs, mentions, punctuation, stop words)
//! - Sparse TF-IDF over unigrams and bigrams
//! - Logistic regression, random forest and linear SVM classifiers
//! - Stratified train/test split with held-out accuracy
//! - Pluggable storage backends for trained models
//! - Input validation and prediction analytics
//!
//! ## Example
//!
//! ```no_run
//! use verity::prelude::*;
//!
//! let detector = FakeNewsDetector::new(DetectorConfig::default())?;
//! if !detector.load_model() {
//!     detector.train();
//! }
//! let result = detector.predict("Scientists confirm the new vaccine passed its trials.")?;
//! println!("{result}");
//! # Ok::<(), verity::error::VerityError>(())
//! ```

pub mod analysis;
pub mod analytics;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod ml;
pub mod model;
pub mod persistence;
pub mod pipeline;
pub mod storage;
pub mod validation;

pub mod prelude {
    pub use crate::analysis::{Analyzer, NewsAnalyzer, TextStatistics};
    pub use crate::config::DetectorConfig;
    pub use crate::dataset::{Article, Dataset, Label};
    pub use crate::detector::FakeNewsDetector;
    pub use crate::error::{Result, VerityError};
    pub use crate::ml::{Classifier, ClassifierModel, ModelType, TfIdfVectorizer};
    pub use crate::model::{PredictionResult, TrainedModel};
    pub use crate::persistence::ModelStore;
    pub use crate::pipeline::{TrainingPipeline, TrainingReport};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
