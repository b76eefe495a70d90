//! The fake news detector facade.
//!
//! [`FakeNewsDetector`] owns the configuration, the normalizer and the
//! currently installed model. The model moves through two states,
//! untrained and trained; a new model is only installed once training or
//! loading has fully succeeded, and the swap happens under a short write
//! lock so concurrent predictions always see a complete model.

use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::analysis::analyzer::news::NewsAnalyzer;
use crate::analytics::AnalyticsLog;
use crate::config::DetectorConfig;
use crate::dataset::Dataset;
use crate::error::{Result, VerityError};
use crate::model::{PredictionResult, TrainedModel};
use crate::persistence::ModelStore;
use crate::pipeline::{TrainingPipeline, TrainingReport};
use crate::storage::FileStorage;
use crate::validation::{InputLimits, validate_input};

/// Lifecycle state of the detector's model.
#[derive(Debug, Clone, Default)]
pub enum ModelState {
    #[default]
    Untrained,
    Trained(Arc<TrainedModel>),
}

impl ModelState {
    pub fn is_trained(&self) -> bool {
        matches!(self, ModelState::Trained(_))
    }

    pub fn model(&self) -> Option<&Arc<TrainedModel>> {
        match self {
            ModelState::Untrained => None,
            ModelState::Trained(model) => Some(model),
        }
    }
}

/// Trains, persists and serves a fake news classifier.
#[derive(Debug)]
pub struct FakeNewsDetector {
    config: DetectorConfig,
    normalizer: NewsAnalyzer,
    store: ModelStore,
    state: RwLock<ModelState>,
    last_error: Mutex<Option<String>>,
    analytics: Option<Mutex<AnalyticsLog>>,
}

impl FakeNewsDetector {
    /// Create an untrained detector storing models under `config.models_dir`.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let store = ModelStore::new(Arc::new(FileStorage::new(&config.models_dir)));
        Self::with_store(config, store)
    }

    /// Create an untrained detector with a custom model store.
    pub fn with_store(config: DetectorConfig, store: ModelStore) -> Result<Self> {
        config.validate()?;
        let analytics = config
            .enable_analytics
            .then(|| Mutex::new(AnalyticsLog::open(&config.analytics_file)));

        Ok(FakeNewsDetector {
            normalizer: NewsAnalyzer::new()?,
            store,
            state: RwLock::new(ModelState::Untrained),
            last_error: Mutex::new(None),
            analytics,
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Train on the configured dataset, falling back to the built-in
    /// synthetic set when it cannot be loaded.
    ///
    /// Returns `false` on failure; the reason is available from
    /// [`last_error`](Self::last_error) and the previous model stays installed.
    pub fn train(&self) -> bool {
        let path = self.config.dataset_path();
        let dataset = match Dataset::load(&path) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!(
                    "Cannot load dataset {}: {e}; falling back to built-in sample data",
                    path.display()
                );
                Dataset::fallback()
            }
        };

        match self.train_on(&dataset) {
            Ok(_) => true,
            Err(e) => {
                error!("Training failed: {e}");
                false
            }
        }
    }

    /// Train on `dataset` and install the resulting model.
    pub fn train_on(&self, dataset: &Dataset) -> Result<TrainingReport> {
        let result = TrainingPipeline::new(&self.config)
            .map(|p| p.with_normalizer(self.normalizer.clone()))
            .and_then(|pipeline| pipeline.train(dataset));

        let (model, report) = match result {
            Ok(trained) => trained,
            Err(e) => {
                *self.last_error.lock() = Some(e.to_string());
                return Err(e);
            }
        };

        if self.config.auto_save {
            if let Err(e) = self.store.save(&model) {
                warn!("Trained model could not be saved: {e}");
            }
        }

        self.install(model);
        Ok(report)
    }

    /// Load the persisted model. Returns `false` when none can be loaded.
    pub fn load_model(&self) -> bool {
        match self.try_load_model() {
            Ok(()) => true,
            Err(e) => {
                info!("No model loaded: {e}");
                false
            }
        }
    }

    /// Load the persisted model, reporting why it failed.
    pub fn try_load_model(&self) -> Result<()> {
        match self.store.load() {
            Ok(model) => {
                self.install(model);
                Ok(())
            }
            Err(e) => {
                *self.last_error.lock() = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Persist the installed model.
    pub fn save_model(&self) -> Result<()> {
        let model = self.model().ok_or(VerityError::NotTrained)?;
        self.store.save(&model)
    }

    fn install(&self, model: TrainedModel) {
        let model = Arc::new(model);
        *self.state.write() = ModelState::Trained(model);
        *self.last_error.lock() = None;
    }

    /// Classify raw article text.
    pub fn predict(&self, text: &str) -> Result<PredictionResult> {
        let model = self.model().ok_or(VerityError::NotTrained)?;
        let result = model.predict(&self.normalizer, text)?;

        if let Some(analytics) = &self.analytics {
            if let Err(e) = analytics.lock().record(&result, text.chars().count()) {
                warn!("Failed to record prediction analytics: {e}");
            }
        }
        Ok(result)
    }

    /// Validate `text` against the configured limits, then classify it.
    pub fn predict_validated(&self, text: &str) -> Result<PredictionResult> {
        validate_input(text, &InputLimits::from(&self.config))?;
        self.predict(text)
    }

    pub fn is_trained(&self) -> bool {
        self.state.read().is_trained()
    }

    /// Held-out accuracy of the installed model; zero when untrained or unknown.
    pub fn accuracy(&self) -> f64 {
        self.model().map_or(0.0, |m| m.accuracy())
    }

    /// Message of the most recent failed train or load.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// The installed model, if any.
    pub fn model(&self) -> Option<Arc<TrainedModel>> {
        self.state.read().model().cloned()
    }

    /// Normalize text exactly as the model sees it.
    pub fn preprocess_text(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// Run `f` against the analytics log, if analytics are enabled.
    pub fn with_analytics<T>(&self, f: impl FnOnce(&AnalyticsLog) -> T) -> Option<T> {
        self.analytics.as_ref().map(|log| f(&log.lock()))
    }

    /// Models directory, for display.
    pub fn models_dir(&self) -> &Path {
        &self.config.models_dir
    }
}
