//! Detector configuration.
//!
//! [`DetectorConfig`] has sensible defaults, can be read from a JSON file
//! (missing keys keep their defaults) and can be overridden from the
//! environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `VERITY_MODEL_TYPE` | `model_type` |
//! | `VERITY_MAX_FEATURES` | `max_features` |
//! | `VERITY_DATA_DIR` | `data_dir` |
//! | `VERITY_MODELS_DIR` | `models_dir` |

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::ml::classifier::ModelType;

/// File name of the training dataset inside `data_dir`.
pub const DATASET_FILE: &str = "processed_news.csv";

pub const ENV_MODEL_TYPE: &str = "VERITY_MODEL_TYPE";
pub const ENV_MAX_FEATURES: &str = "VERITY_MAX_FEATURES";
pub const ENV_DATA_DIR: &str = "VERITY_DATA_DIR";
pub const ENV_MODELS_DIR: &str = "VERITY_MODELS_DIR";

/// Configuration for training, prediction and input validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Maximum vocabulary size of the vectorizer.
    pub max_features: usize,
    /// Classifier algorithm.
    pub model_type: ModelType,
    /// Confidence below which a prediction is reported as uncertain.
    pub min_confidence: f64,
    /// Minimum input length in characters, after trimming.
    pub min_text_length: usize,
    /// Maximum input length in characters.
    pub max_text_length: usize,
    /// Minimum number of whitespace-separated words.
    pub min_word_count: usize,
    /// Held-out fraction for evaluation.
    pub test_size: f64,
    /// Seed for splitting and randomized classifiers.
    pub random_seed: u64,
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    /// Persist the model after every successful training run.
    pub auto_save: bool,
    /// Record predictions in the analytics log.
    pub enable_analytics: bool,
    pub analytics_file: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            max_features: 5000,
            model_type: ModelType::LogisticRegression,
            min_confidence: 0.6,
            min_text_length: 50,
            max_text_length: 10000,
            min_word_count: 10,
            test_size: 0.2,
            random_seed: 42,
            data_dir: PathBuf::from("data"),
            models_dir: PathBuf::from("models/saved_models"),
            auto_save: true,
            enable_analytics: true,
            analytics_file: PathBuf::from("analytics_data.json"),
        }
    }
}

impl DetectorConfig {
    /// Read a JSON config file. Keys that are absent keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VerityError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: DetectorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults or `path`, then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `VERITY_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MODEL_TYPE) {
            self.model_type = value.parse()?;
            debug!("{ENV_MODEL_TYPE} overrides model type: {}", self.model_type);
        }
        if let Some(value) = lookup(ENV_MAX_FEATURES) {
            self.max_features = value.trim().parse().map_err(|_| {
                VerityError::invalid_config(format!("{ENV_MAX_FEATURES} is not a number: {value}"))
            })?;
        }
        if let Some(value) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_MODELS_DIR) {
            self.models_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// Reject values that would make training or validation meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(VerityError::invalid_config("max_features must be positive"));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(VerityError::invalid_config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.min_text_length > self.max_text_length {
            return Err(VerityError::invalid_config(format!(
                "min_text_length ({}) exceeds max_text_length ({})",
                self.min_text_length, self.max_text_length
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(VerityError::invalid_config(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }

    /// Path of the training dataset.
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILE)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.model_type, ModelType::LogisticRegression);
        assert_eq!(config.min_text_length, 50);
        assert_eq!(config.max_text_length, 10000);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_seed, 42);
        assert!(config.auto_save);
        assert_eq!(
            config.dataset_path(),
            PathBuf::from("data").join("processed_news.csv")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_MODEL_TYPE, "svm"),
            (ENV_MAX_FEATURES, "100"),
            (ENV_MODELS_DIR, "/tmp/models"),
        ]
        .into_iter()
        .collect();

        let mut config = DetectorConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.model_type, ModelType::Svm);
        assert_eq!(config.max_features, 100);
        assert_eq!(config.models_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_bad_overrides() {
        let mut config = DetectorConfig::default();
        assert!(config
            .apply_overrides(|key| (key == ENV_MAX_FEATURES).then(|| "lots".to_string()))
            .is_err());
        assert!(config
            .apply_overrides(|key| (key == ENV_MODEL_TYPE).then(|| "bayes".to_string()))
            .is_err());
    }

    #[test]
    fn test_validate() {
        let config = DetectorConfig {
            max_features: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            test_size: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            min_text_length: 200,
            max_text_length: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_keeps_missing_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("verity.json");
        fs::write(&path, r#"{"model_type": "random_forest", "max_features": 1000}"#).unwrap();

        let config = DetectorConfig::from_file(&path).unwrap();
        assert_eq!(config.model_type, ModelType::RandomForest);
        assert_eq!(config.max_features, 1000);
        assert_eq!(config.min_confidence, 0.6);

        fs::write(&path, r#"{"test_size": 2.0}"#).unwrap();
        assert!(DetectorConfig::from_file(&path).is_err());
        assert!(DetectorConfig::from_file(temp_dir.path().join("missing.json")).is_err());
    }
}
