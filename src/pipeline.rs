//! End-to-end training: normalize, split, vectorize, fit, evaluate.

use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::news::NewsAnalyzer;
use crate::config::DetectorConfig;
use crate::dataset::{Dataset, Label};
use crate::error::{Result, VerityError};
use crate::ml::classifier::{Classifier, ClassifierModel, ModelType};
use crate::ml::metrics::ClassificationReport;
use crate::ml::split::stratified_split;
use crate::ml::vectorizer::TfIdfVectorizer;
use crate::model::{ModelMetadata, TrainedModel};

/// Summary of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Fraction of held-out rows classified correctly.
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
    pub vocabulary_size: usize,
    pub model_type: ModelType,
    /// Trained on the built-in synthetic data; accuracy says nothing about real news.
    pub degraded: bool,
    pub duration: Duration,
}

/// Trains a [`TrainedModel`] from a labeled [`Dataset`].
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    normalizer: NewsAnalyzer,
    model_type: ModelType,
    max_features: usize,
    test_size: f64,
    seed: u64,
}

impl TrainingPipeline {
    /// Create a pipeline from the training-related parts of `config`.
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(TrainingPipeline {
            normalizer: NewsAnalyzer::new()?,
            model_type: config.model_type,
            max_features: config.max_features,
            test_size: config.test_size,
            seed: config.random_seed,
        })
    }

    /// Use a specific normalizer.
    pub fn with_normalizer(mut self, normalizer: NewsAnalyzer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &NewsAnalyzer {
        &self.normalizer
    }

    /// Run the full training procedure.
    ///
    /// The vectorizer only ever sees the training subset. Nothing is
    /// returned unless every step succeeds.
    pub fn train(&self, dataset: &Dataset) -> Result<(TrainedModel, TrainingReport)> {
        let started = Instant::now();
        let degraded = dataset.is_fallback();
        if degraded {
            warn!(
                "Training on the built-in synthetic dataset ({} rows); accuracy is not representative",
                dataset.len()
            );
        }
        if dataset.is_empty() {
            return Err(VerityError::empty_corpus("dataset has no articles"));
        }

        let labels = dataset.labels();
        let classes = Label::ALL
            .iter()
            .filter(|class| labels.contains(class))
            .count();
        if classes < 2 {
            return Err(VerityError::InsufficientClasses { found: classes });
        }

        let texts = self.normalizer.normalize_all(&dataset.texts());
        let split = stratified_split(&labels, self.test_size, self.seed)?;
        debug!(
            "Split {} articles into {} train / {} test",
            dataset.len(),
            split.train.len(),
            split.test.len()
        );

        let select = |rows: &[usize]| -> (Vec<&str>, Vec<Label>) {
            rows.iter()
                .map(|&i| (texts[i].as_str(), labels[i]))
                .unzip()
        };
        let (train_texts, train_labels) = select(&split.train);
        let (test_texts, test_labels) = select(&split.test);

        let mut vectorizer = TfIdfVectorizer::new(self.max_features);
        let x_train = vectorizer.fit_transform(&train_texts)?;

        let mut classifier = ClassifierModel::new(self.model_type, self.seed);
        classifier.fit(&x_train, &train_labels)?;

        let predictions = test_texts
            .iter()
            .map(|text| classifier.predict(&vectorizer.transform(text)?))
            .collect::<Result<Vec<Label>>>()?;
        let report = ClassificationReport::new(&test_labels, &predictions);

        let training_report = TrainingReport {
            accuracy: report.accuracy,
            n_train: train_texts.len(),
            n_test: test_texts.len(),
            vocabulary_size: vectorizer.vocabulary_size(),
            model_type: self.model_type,
            degraded,
            duration: started.elapsed(),
            report,
        };

        let metadata = ModelMetadata {
            model_type: self.model_type,
            accuracy: training_report.accuracy,
            degraded,
            vocabulary_size: training_report.vocabulary_size,
            n_train: training_report.n_train,
            n_test: training_report.n_test,
            trained_at: Utc::now(),
        };
        let model = TrainedModel::new(vectorizer, classifier, Some(metadata))?;

        info!(
            "Trained {} model: accuracy {:.3} on {} held-out articles, {} terms, {:?}",
            self.model_type,
            training_report.accuracy,
            training_report.n_test,
            training_report.vocabulary_size,
            training_report.duration
        );

        Ok((model, training_report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Article;

    fn pipeline(model_type: ModelType) -> TrainingPipeline {
        TrainingPipeline::new(&DetectorConfig {
            model_type,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_train_on_fallback() {
        let (model, report) = pipeline(ModelType::LogisticRegression)
            .train(&Dataset::fallback())
            .unwrap();

        assert!(report.degraded);
        assert_eq!(report.n_train, 480);
        assert_eq!(report.n_test, 120);
        assert!((0.5..=1.0).contains(&report.accuracy));
        assert_eq!(report.report.confusion.total(), 120);
        assert_eq!(model.vectorizer().vocabulary_size(), report.vocabulary_size);
        assert!(model.metadata().unwrap().degraded);
    }

    #[test]
    fn test_single_class_fails() {
        let dataset = Dataset::new(
            (0..10)
                .map(|i| Article::labeled(format!("only real article number {i}"), Label::Real))
                .collect(),
        )
        .unwrap();

        let err = pipeline(ModelType::LogisticRegression)
            .train(&dataset)
            .unwrap_err();
        assert!(matches!(err, VerityError::InsufficientClasses { found: 1 }));
    }

    #[test]
    fn test_empty_dataset_fails() {
        let dataset = Dataset::new(Vec::new()).unwrap();
        let err = pipeline(ModelType::Svm).train(&dataset).unwrap_err();
        assert!(matches!(err, VerityError::EmptyCorpus(_)));
    }

    #[test]
    fn test_stopword_only_corpus_fails() {
        let dataset = Dataset::new(vec![
            Article::labeled("the and of", Label::Real),
            Article::labeled("is it a", Label::Real),
            Article::labeled("to be or not", Label::Fake),
            Article::labeled("we are the", Label::Fake),
        ])
        .unwrap();

        let err = pipeline(ModelType::LogisticRegression)
            .train(&dataset)
            .unwrap_err();
        assert!(matches!(err, VerityError::EmptyCorpus(_)));
    }

    #[test]
    fn test_training_is_reproducible() {
        let (a, ra) = pipeline(ModelType::RandomForest)
            .train(&Dataset::fallback())
            .unwrap();
        let (b, rb) = pipeline(ModelType::RandomForest)
            .train(&Dataset::fallback())
            .unwrap();

        assert_eq!(ra.accuracy, rb.accuracy);
        assert_eq!(a.vectorizer(), b.vectorizer());
        assert_eq!(a.classifier(), b.classifier());
    }
}
