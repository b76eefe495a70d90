use std::fs;

use tempfile::TempDir;

use verity::config::DetectorConfig;
use verity::dataset::Dataset;
use verity::detector::FakeNewsDetector;
use verity::error::VerityError;
use verity::ml::ModelType;
use verity::persistence::{CLASSIFIER_BLOB, METADATA_FILE, VECTORIZER_BLOB};

fn config_in(dir: &TempDir, model_type: ModelType) -> DetectorConfig {
    DetectorConfig {
        model_type,
        models_dir: dir.path().join("models"),
        enable_analytics: false,
        ..DetectorConfig::default()
    }
}

#[test]
fn test_saved_model_reproduces_predictions() {
    let texts = [
        "Miracle cure discovered that eliminates all diseases overnight",
        "Hospital reports successful treatment of rare disease",
        "Some words the model never saw during training",
    ];

    for model_type in ModelType::ALL {
        let dir = TempDir::new().unwrap();

        let trained = FakeNewsDetector::new(config_in(&dir, model_type)).unwrap();
        trained.train_on(&Dataset::fallback()).unwrap();

        let models_dir = dir.path().join("models");
        assert!(models_dir.join(VECTORIZER_BLOB).exists());
        assert!(models_dir.join(CLASSIFIER_BLOB).exists());
        assert!(models_dir.join(METADATA_FILE).exists());

        let loaded = FakeNewsDetector::new(config_in(&dir, model_type)).unwrap();
        assert!(loaded.load_model());
        assert_eq!(loaded.model().unwrap().model_type(), model_type);
        assert_eq!(loaded.accuracy(), trained.accuracy());

        for text in texts {
            let before = trained.predict(text).unwrap();
            let after = loaded.predict(text).unwrap();
            assert_eq!(before.label, after.label);
            assert_eq!(
                before.probabilities[1].to_bits(),
                after.probabilities[1].to_bits(),
                "{model_type}: {text}"
            );
        }
    }
}

#[test]
fn test_load_without_saved_model() {
    let dir = TempDir::new().unwrap();
    let detector = FakeNewsDetector::new(config_in(&dir, ModelType::LogisticRegression)).unwrap();

    assert!(!detector.load_model());
    assert!(!detector.is_trained());
    assert!(matches!(
        detector.try_load_model(),
        Err(VerityError::ModelNotFound(_))
    ));
}

#[test]
fn test_load_corrupt_classifier() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, ModelType::LogisticRegression);

    let trained = FakeNewsDetector::new(config.clone()).unwrap();
    trained.train_on(&Dataset::fallback()).unwrap();
    fs::write(dir.path().join("models").join(CLASSIFIER_BLOB), b"not a model").unwrap();

    let detector = FakeNewsDetector::new(config).unwrap();
    assert!(matches!(
        detector.try_load_model(),
        Err(VerityError::Serialization(_))
    ));
    assert!(!detector.is_trained());
}

#[test]
fn test_missing_metadata_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, ModelType::LogisticRegression);

    let trained = FakeNewsDetector::new(config.clone()).unwrap();
    trained.train_on(&Dataset::fallback()).unwrap();
    fs::remove_file(dir.path().join("models").join(METADATA_FILE)).unwrap();

    let detector = FakeNewsDetector::new(config).unwrap();
    assert!(detector.load_model());
    assert_eq!(detector.accuracy(), 0.0);
    assert!(detector.predict("Aliens landed downtown").is_ok());
}
