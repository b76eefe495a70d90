//! Trained models and their predictions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::news::NewsAnalyzer;
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::classifier::{Classifier, ClassifierModel, ModelType};
use crate::ml::vectorizer::TfIdfVectorizer;

/// Facts about how a model was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: ModelType,
    /// Held-out accuracy measured at training time.
    pub accuracy: f64,
    /// Trained on the built-in synthetic data rather than a real corpus.
    pub degraded: bool,
    pub vocabulary_size: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub trained_at: DateTime<Utc>,
}

/// A fitted vectorizer and classifier pair.
///
/// Immutable once built; share it as `Arc<TrainedModel>`.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    vectorizer: TfIdfVectorizer,
    classifier: ClassifierModel,
    metadata: Option<ModelMetadata>,
}

impl TrainedModel {
    /// Bundle fitted components. Both must already be fitted, and the
    /// classifier must expect the vectorizer's feature space.
    pub fn new(
        vectorizer: TfIdfVectorizer,
        classifier: ClassifierModel,
        metadata: Option<ModelMetadata>,
    ) -> Result<Self> {
        if !vectorizer.is_fitted() {
            return Err(VerityError::not_fitted("TfIdfVectorizer"));
        }
        if !classifier.is_fitted() {
            return Err(VerityError::not_fitted(classifier.name()));
        }
        vectorizer.check_consistency()?;
        classifier.check_dimension(vectorizer.vocabulary_size())?;
        Ok(TrainedModel {
            vectorizer,
            classifier,
            metadata,
        })
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &ClassifierModel {
        &self.classifier
    }

    /// Training metadata; absent for models loaded without it.
    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn model_type(&self) -> ModelType {
        self.classifier.model_type()
    }

    /// Held-out accuracy, zero when unknown.
    pub fn accuracy(&self) -> f64 {
        self.metadata.as_ref().map_or(0.0, |m| m.accuracy)
    }

    /// Classify text that has already been normalized.
    pub fn predict_normalized(&self, normalized: &str) -> Result<PredictionResult> {
        let features = self.vectorizer.transform(normalized)?;
        let probabilities = self.classifier.predict_proba(&features)?;
        Ok(PredictionResult::from_probabilities(probabilities))
    }

    /// Normalize, vectorize and classify raw article text.
    pub fn predict(&self, normalizer: &NewsAnalyzer, text: &str) -> Result<PredictionResult> {
        self.predict_normalized(&normalizer.normalize(text))
    }
}

/// Outcome of classifying one article.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    /// Probability of the predicted label.
    pub confidence: f64,
    /// `[P(real), P(fake)]`
    pub probabilities: [f64; 2],
}

impl PredictionResult {
    /// Build a result from class probabilities, renormalized to sum to one.
    pub fn from_probabilities(probabilities: [f64; 2]) -> Self {
        let p0 = probabilities[0].max(0.0);
        let p1 = probabilities[1].max(0.0);
        let total = p0 + p1;
        let probabilities = if total > 0.0 && total.is_finite() {
            [p0 / total, p1 / total]
        } else {
            [0.5, 0.5]
        };

        let label = Label::from_probabilities(&probabilities);
        PredictionResult {
            label,
            confidence: probabilities[label.index()],
            probabilities,
        }
    }

    pub fn is_fake(&self) -> bool {
        self.label == Label::Fake
    }

    /// Whether the confidence reaches `min_confidence`.
    pub fn is_confident(&self, min_confidence: f64) -> bool {
        self.confidence >= min_confidence
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} confidence)",
            self.label.as_str().to_uppercase(),
            format_confidence(self.confidence)
        )
    }
}

/// Render a probability as a percentage with one decimal, e.g. `87.5%`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_from_probabilities() {
        let result = PredictionResult::from_probabilities([0.2, 0.6]);
        assert_eq!(result.label, Label::Fake);
        assert!((result.probabilities[0] + result.probabilities[1] - 1.0).abs() < 1e-12);
        assert!((result.confidence - 0.75).abs() < 1e-12);
        assert!(result.is_fake());
        assert!(result.is_confident(0.6));
        assert!(!result.is_confident(0.8));
    }

    #[test]
    fn test_prediction_tie_and_degenerate_input() {
        let tie = PredictionResult::from_probabilities([0.5, 0.5]);
        assert_eq!(tie.label, Label::Real);
        assert_eq!(tie.confidence, 0.5);

        let degenerate = PredictionResult::from_probabilities([0.0, f64::NAN]);
        assert_eq!(degenerate.probabilities, [0.5, 0.5]);
    }

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.875), "87.5%");
        assert_eq!(format_confidence(1.0), "100.0%");
        let result = PredictionResult::from_probabilities([0.9, 0.1]);
        assert_eq!(result.to_string(), "REAL (90.0% confidence)");
    }

    #[test]
    fn test_model_requires_fitted_components() {
        let err = TrainedModel::new(
            TfIdfVectorizer::default(),
            ClassifierModel::new(ModelType::LogisticRegression, 42),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, VerityError::NotFitted(_)));
    }
}
