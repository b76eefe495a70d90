//! Saving and loading trained models.
//!
//! A model is stored as two independent blobs, `vectorizer.bin` and
//! `classifier.bin`, both bincode-encoded. Training metadata goes into an
//! optional `metadata.json`; a model loads fine without it.

use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, VerityError};
use crate::ml::classifier::ClassifierModel;
use crate::ml::vectorizer::TfIdfVectorizer;
use crate::model::{ModelMetadata, TrainedModel};
use crate::storage::Storage;

pub const VECTORIZER_BLOB: &str = "vectorizer.bin";
pub const CLASSIFIER_BLOB: &str = "classifier.bin";
pub const METADATA_FILE: &str = "metadata.json";

/// Reads and writes [`TrainedModel`]s through a [`Storage`] backend.
#[derive(Debug, Clone)]
pub struct ModelStore {
    storage: Arc<dyn Storage>,
}

impl ModelStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ModelStore { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Whether both model blobs are present.
    pub fn exists(&self) -> bool {
        self.storage.exists(VECTORIZER_BLOB) && self.storage.exists(CLASSIFIER_BLOB)
    }

    /// Write the model's blobs, replacing any previous model.
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        let vectorizer = encode(model.vectorizer(), VECTORIZER_BLOB)?;
        let classifier = encode(model.classifier(), CLASSIFIER_BLOB)?;

        self.storage.write_all(VECTORIZER_BLOB, &vectorizer)?;
        self.storage.write_all(CLASSIFIER_BLOB, &classifier)?;

        match model.metadata() {
            Some(metadata) => {
                let json = serde_json::to_vec_pretty(metadata)?;
                self.storage.write_all(METADATA_FILE, &json)?;
            }
            None if self.storage.exists(METADATA_FILE) => {
                self.storage.delete(METADATA_FILE)?;
            }
            None => {}
        }

        info!(
            "Saved {} model ({} + {} bytes)",
            model.model_type(),
            vectorizer.len(),
            classifier.len()
        );
        Ok(())
    }

    /// Restore a model ready for prediction.
    ///
    /// Fails with [`VerityError::ModelNotFound`] when either blob is missing
    /// and with [`VerityError::Serialization`] when one cannot be decoded.
    pub fn load(&self) -> Result<TrainedModel> {
        for name in [VECTORIZER_BLOB, CLASSIFIER_BLOB] {
            if !self.storage.exists(name) {
                return Err(VerityError::model_not_found(name));
            }
        }

        let vectorizer: TfIdfVectorizer =
            decode(&self.storage.read_all(VECTORIZER_BLOB)?, VECTORIZER_BLOB)?;
        let classifier: ClassifierModel =
            decode(&self.storage.read_all(CLASSIFIER_BLOB)?, CLASSIFIER_BLOB)?;
        let metadata = self.load_metadata();

        let model = TrainedModel::new(vectorizer, classifier, metadata)
            .map_err(|e| VerityError::serialization(format!("stored model is unusable: {e}")))?;

        info!(
            "Loaded {} model with {} terms",
            model.model_type(),
            model.vectorizer().vocabulary_size()
        );
        Ok(model)
    }

    /// Delete all stored blobs.
    pub fn clear(&self) -> Result<()> {
        for name in [VECTORIZER_BLOB, CLASSIFIER_BLOB, METADATA_FILE] {
            if self.storage.exists(name) {
                self.storage.delete(name)?;
            }
        }
        Ok(())
    }

    fn load_metadata(&self) -> Option<ModelMetadata> {
        if !self.storage.exists(METADATA_FILE) {
            return None;
        }
        let parsed = self
            .storage
            .read_all(METADATA_FILE)
            .and_then(|bytes| Ok(serde_json::from_slice(&bytes)?));
        match parsed {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("Ignoring unreadable {METADATA_FILE}: {e}");
                None
            }
        }
    }
}

fn encode<T: Serialize>(value: &T, name: &str) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| VerityError::serialization(format!("failed to encode {name}: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8], name: &str) -> Result<T> {
    let (value, read) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| VerityError::serialization(format!("failed to decode {name}: {e}")))?;
    if read != bytes.len() {
        return Err(VerityError::serialization(format!(
            "{name} has {} trailing bytes",
            bytes.len() - read
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::dataset::Label;
    use crate::ml::classifier::{Classifier, ModelType};
    use crate::storage::MemoryStorage;

    fn small_model(metadata: bool) -> TrainedModel {
        let corpus = [
            "miracle cure overnight",
            "aliens landed downtown",
            "researchers publish study",
            "government announces funding",
        ];
        let labels = [Label::Fake, Label::Fake, Label::Real, Label::Real];

        let mut vectorizer = TfIdfVectorizer::default();
        let x = vectorizer.fit_transform(&corpus).unwrap();
        let mut classifier = ClassifierModel::new(ModelType::LogisticRegression, 42);
        classifier.fit(&x, &labels).unwrap();

        let metadata = metadata.then(|| ModelMetadata {
            model_type: ModelType::LogisticRegression,
            accuracy: 1.0,
            degraded: false,
            vocabulary_size: vectorizer.vocabulary_size(),
            n_train: 4,
            n_test: 0,
            trained_at: Utc::now(),
        });
        TrainedModel::new(vectorizer, classifier, metadata).unwrap()
    }

    #[test]
    fn test_roundtrip_is_exact() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ModelStore::new(storage.clone());
        let model = small_model(true);

        assert!(!store.exists());
        store.save(&model).unwrap();
        assert!(store.exists());
        assert_eq!(
            storage.list_files().unwrap(),
            vec![CLASSIFIER_BLOB, METADATA_FILE, VECTORIZER_BLOB]
        );

        let loaded = store.load().unwrap();
        assert_eq!(loaded.vectorizer(), model.vectorizer());
        assert_eq!(loaded.classifier(), model.classifier());
        assert_eq!(loaded.metadata(), model.metadata());

        let before = model.predict_normalized("miracle cure").unwrap();
        let after = loaded.predict_normalized("miracle cure").unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_blob_is_model_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ModelStore::new(storage.clone());
        assert!(matches!(store.load().unwrap_err(), VerityError::ModelNotFound(_)));

        store.save(&small_model(false)).unwrap();
        storage.delete(CLASSIFIER_BLOB).unwrap();
        match store.load().unwrap_err() {
            VerityError::ModelNotFound(name) => assert_eq!(name, CLASSIFIER_BLOB),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_blob_is_serialization_error() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ModelStore::new(storage.clone());
        store.save(&small_model(false)).unwrap();

        storage.write_all(VECTORIZER_BLOB, b"\xff\xff\xff not bincode").unwrap();
        assert!(matches!(store.load().unwrap_err(), VerityError::Serialization(_)));
    }

    #[test]
    fn test_inconsistent_vectorizer_is_serialization_error() {
        #[derive(Serialize)]
        struct RawVectorizer {
            max_features: usize,
            ngram_range: (usize, usize),
            vocabulary: BTreeMap<String, usize>,
            idf: Vec<f64>,
            n_documents: usize,
        }

        let storage = Arc::new(MemoryStorage::new());
        let store = ModelStore::new(storage.clone());
        store.save(&small_model(false)).unwrap();

        let raw = RawVectorizer {
            max_features: 5000,
            ngram_range: (1, 2),
            vocabulary: BTreeMap::from([("aliens".to_string(), 999)]),
            idf: vec![1.0],
            n_documents: 4,
        };
        storage
            .write_all(VECTORIZER_BLOB, &encode(&raw, VECTORIZER_BLOB).unwrap())
            .unwrap();

        assert!(matches!(store.load().unwrap_err(), VerityError::Serialization(_)));
    }

    #[test]
    fn test_mismatched_classifier_is_serialization_error() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ModelStore::new(storage.clone());
        store.save(&small_model(false)).unwrap();

        let mut vectorizer = TfIdfVectorizer::default();
        let x = vectorizer.fit_transform(&["alpha beta", "gamma delta"]).unwrap();
        let mut classifier = ClassifierModel::new(ModelType::LogisticRegression, 42);
        classifier.fit(&x, &[Label::Fake, Label::Real]).unwrap();
        storage
            .write_all(CLASSIFIER_BLOB, &encode(&classifier, CLASSIFIER_BLOB).unwrap())
            .unwrap();

        match store.load().unwrap_err() {
            VerityError::Serialization(message) => assert!(message.contains("features")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_metadata_is_optional() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ModelStore::new(storage.clone());

        store.save(&small_model(true)).unwrap();
        storage.write_all(METADATA_FILE, b"{ broken").unwrap();
        let loaded = store.load().unwrap();
        assert!(loaded.metadata().is_none());

        store.save(&small_model(false)).unwrap();
        assert!(!storage.exists(METADATA_FILE));

        store.clear().unwrap();
        assert_eq!(storage.file_count(), 0);
    }
}
