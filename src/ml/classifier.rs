//! Binary classifiers over sparse TF-IDF vectors.
//!
//! Every classifier implements [`Classifier`]. The concrete model is chosen
//! at construction time through [`ModelType`] and held in the
//! [`ClassifierModel`] tagged union, which is also the persisted form.

pub mod logistic;
pub mod random_forest;
pub mod svm;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::sparse::SparseVector;

pub use logistic::LogisticRegression;
pub use random_forest::RandomForest;
pub use svm::SupportVectorClassifier;

/// Trait for binary text classifiers.
pub trait Classifier: Send + Sync {
    /// Fit the classifier on feature vectors and their labels.
    fn fit(&mut self, x: &[SparseVector], y: &[Label]) -> Result<()>;

    /// Class probabilities `[P(real), P(fake)]`, summing to one.
    fn predict_proba(&self, x: &SparseVector) -> Result<[f64; 2]>;

    /// Most probable label; ties go to [`Label::Real`].
    fn predict(&self, x: &SparseVector) -> Result<Label> {
        Ok(Label::from_probabilities(&self.predict_proba(x)?))
    }

    /// Get the name of this classifier.
    fn name(&self) -> &'static str;

    /// Whether `fit` has completed successfully.
    fn is_fitted(&self) -> bool;

    /// Check that the fitted parameters expect `n_features` input features.
    fn check_dimension(&self, n_features: usize) -> Result<()>;
}

/// Error for fitted parameters that do not match the feature space.
pub(crate) fn dimension_mismatch(name: &str, expected: usize, found: usize) -> VerityError {
    VerityError::invalid_argument(format!(
        "{name} was fitted on {found} features, expected {expected}"
    ))
}

/// Available classifier algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    #[default]
    LogisticRegression,
    RandomForest,
    Svm,
}

impl ModelType {
    pub const ALL: [ModelType; 3] = [
        ModelType::LogisticRegression,
        ModelType::RandomForest,
        ModelType::Svm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::LogisticRegression => "logistic_regression",
            ModelType::RandomForest => "random_forest",
            ModelType::Svm => "svm",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = VerityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "logistic_regression" | "logistic" | "lr" => Ok(ModelType::LogisticRegression),
            "random_forest" | "forest" | "rf" => Ok(ModelType::RandomForest),
            "svm" | "svc" => Ok(ModelType::Svm),
            other => Err(VerityError::invalid_config(format!(
                "unknown model type '{other}' (expected logistic_regression, random_forest or svm)"
            ))),
        }
    }
}

/// A classifier of any supported type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassifierModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    Svm(SupportVectorClassifier),
}

impl ClassifierModel {
    /// Create an unfitted classifier of the given type.
    pub fn new(model_type: ModelType, seed: u64) -> Self {
        match model_type {
            ModelType::LogisticRegression => {
                ClassifierModel::LogisticRegression(LogisticRegression::new(seed))
            }
            ModelType::RandomForest => ClassifierModel::RandomForest(RandomForest::new(seed)),
            ModelType::Svm => ClassifierModel::Svm(SupportVectorClassifier::new(seed)),
        }
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            ClassifierModel::LogisticRegression(_) => ModelType::LogisticRegression,
            ClassifierModel::RandomForest(_) => ModelType::RandomForest,
            ClassifierModel::Svm(_) => ModelType::Svm,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            ClassifierModel::LogisticRegression(m) => m,
            ClassifierModel::RandomForest(m) => m,
            ClassifierModel::Svm(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            ClassifierModel::LogisticRegression(m) => m,
            ClassifierModel::RandomForest(m) => m,
            ClassifierModel::Svm(m) => m,
        }
    }
}

impl Classifier for ClassifierModel {
    fn fit(&mut self, x: &[SparseVector], y: &[Label]) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &SparseVector) -> Result<[f64; 2]> {
        self.inner().predict_proba(x)
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }

    fn check_dimension(&self, n_features: usize) -> Result<()> {
        self.inner().check_dimension(n_features)
    }
}

/// Check a training set and return its feature dimension.
pub(crate) fn check_training_data(x: &[SparseVector], y: &[Label]) -> Result<usize> {
    if x.is_empty() {
        return Err(VerityError::empty_corpus("no training samples"));
    }
    if x.len() != y.len() {
        return Err(VerityError::invalid_argument(format!(
            "{} samples but {} labels",
            x.len(),
            y.len()
        )));
    }

    let dimension = x[0].dimension();
    if x.iter().any(|v| v.dimension() != dimension) {
        return Err(VerityError::invalid_argument(
            "training vectors have different dimensions",
        ));
    }

    let has_real = y.contains(&Label::Real);
    let has_fake = y.contains(&Label::Fake);
    if !(has_real && has_fake) {
        return Err(VerityError::InsufficientClasses {
            found: usize::from(has_real) + usize::from(has_fake),
        });
    }

    Ok(dimension)
}

/// Clamp to `[0, 1]` and return `[1 - p, p]` for `p = P(fake)`.
pub(crate) fn binary_probabilities(p_fake: f64) -> [f64; 2] {
    let p = if p_fake.is_finite() {
        p_fake.clamp(0.0, 1.0)
    } else {
        0.5
    };
    [1.0 - p, p]
}

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_model_type_parsing() {
        assert_eq!(
            "logistic_regression".parse::<ModelType>().unwrap(),
            ModelType::LogisticRegression
        );
        assert_eq!("Random_Forest".parse::<ModelType>().unwrap(), ModelType::RandomForest);
        assert_eq!("svm".parse::<ModelType>().unwrap(), ModelType::Svm);
        assert!("naive_bayes".parse::<ModelType>().is_err());
        assert_eq!(ModelType::default(), ModelType::LogisticRegression);
    }

    #[test]
    fn test_model_type_serde() {
        let json = serde_json::to_string(&ModelType::RandomForest).unwrap();
        assert_eq!(json, "\"random_forest\"");
        let parsed: ModelType = serde_json::from_str("\"svm\"").unwrap();
        assert_eq!(parsed, ModelType::Svm);
    }

    #[test]
    fn test_every_model_type_classifies_toy_data() {
        let (x, y) = toy_data();
        for model_type in ModelType::ALL {
            let mut model = ClassifierModel::new(model_type, 42);
            assert!(!model.is_fitted());
            model.fit(&x, &y).unwrap();
            assert!(model.is_fitted());
            assert_eq!(model.model_type(), model_type);

            for probe in [real_probe(), fake_probe()] {
                let proba = model.predict_proba(&probe).unwrap();
                assert!((proba[0] + proba[1] - 1.0).abs() < 1e-9);
                assert_eq!(model.predict(&probe).unwrap(), Label::from_probabilities(&proba));
            }
            assert_eq!(model.predict(&real_probe()).unwrap(), Label::Real, "{model_type}");
            assert_eq!(model.predict(&fake_probe()).unwrap(), Label::Fake, "{model_type}");
        }
    }

    #[test]
    fn test_single_class_is_rejected() {
        let (x, _) = toy_data();
        let y = vec![Label::Real; x.len()];
        for model_type in ModelType::ALL {
            let mut model = ClassifierModel::new(model_type, 42);
            let err = model.fit(&x, &y).unwrap_err();
            assert!(matches!(err, VerityError::InsufficientClasses { found: 1 }));
            assert!(!model.is_fitted());
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        for model_type in ModelType::ALL {
            let model = ClassifierModel::new(model_type, 42);
            let err = model.predict_proba(&real_probe()).unwrap_err();
            assert!(matches!(err, VerityError::NotFitted(_)));
        }
    }

    #[test]
    fn test_check_dimension() {
        let (x, y) = toy_data();
        for model_type in ModelType::ALL {
            let mut model = ClassifierModel::new(model_type, 42);
            assert!(matches!(
                model.check_dimension(4),
                Err(VerityError::NotFitted(_))
            ));

            model.fit(&x, &y).unwrap();
            assert!(model.check_dimension(4).is_ok(), "{model_type}");
            assert!(model.check_dimension(0).is_err(), "{model_type}");
        }
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let (x, y) = toy_data();
        let mut model = ClassifierModel::new(ModelType::LogisticRegression, 42);
        assert!(model.fit(&x, &y[..3]).is_err());
    }

    #[test]
    fn test_binary_probabilities() {
        assert_eq!(binary_probabilities(0.25), [0.75, 0.25]);
        assert_eq!(binary_probabilities(1.5), [0.0, 1.0]);
        assert_eq!(binary_probabilities(f64::NAN), [0.5, 0.5]);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
    }
}
