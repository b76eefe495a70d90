//! Machine learning components for Verity.
//!
//! Feature extraction ([`vectorizer`]), the classifiers ([`classifier`]) and
//! the evaluation helpers ([`split`], [`metrics`]) used by the training
//! pipeline.

pub mod classifier;
pub mod metrics;
pub mod sparse;
pub mod split;
pub mod vectorizer;

pub use classifier::{Classifier, ClassifierModel, ModelType};
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use sparse::SparseVector;
pub use vectorizer::TfIdfVectorizer;
