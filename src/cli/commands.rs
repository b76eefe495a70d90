//! Command implementations for the Verity CLI.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use chrono::Utc;
use log::{info, warn};

use crate::analysis::stats::TextStatistics;
use crate::analytics::AnalyticsLog;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::DetectorConfig;
use crate::dataset::Dataset;
use crate::detector::FakeNewsDetector;
use crate::error::{Result, VerityError};
use crate::validation::{check_text_quality, sanitize_text};

/// Execute a CLI command.
pub fn execute_command(args: VerityArgs) -> Result<()> {
    let config = DetectorConfig::load(args.config.as_deref())?;

    match &args.command {
        Command::Train(train_args) => train_model(train_args.clone(), config, &args),
        Command::Predict(predict_args) => predict_text(predict_args.clone(), config, &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
        Command::Analytics(analytics_args) => {
            show_analytics(analytics_args.clone(), config, &args)
        }
    }
}

/// Train a model and optionally save it.
fn train_model(args: TrainArgs, mut config: DetectorConfig, cli_args: &VerityArgs) -> Result<()> {
    if let Some(model_type) = args.model_type {
        config.model_type = model_type;
    }
    if let Some(max_features) = args.max_features {
        config.max_features = max_features;
    }
    if let Some(models_dir) = args.models_dir {
        config.models_dir = models_dir;
    }
    // Saving is done here so a failed save fails the command.
    config.auto_save = false;

    let dataset = if args.sample_data {
        Dataset::fallback()
    } else if let Some(path) = &args.dataset {
        Dataset::load(path)?
    } else {
        let path = config.dataset_path();
        Dataset::load(&path).unwrap_or_else(|e| {
            warn!(
                "Cannot load dataset {}: {e}; falling back to built-in sample data",
                path.display()
            );
            Dataset::fallback()
        })
    };
    info!("Training on {} articles", dataset.len());

    let detector = FakeNewsDetector::new(config)?;
    let report = detector.train_on(&dataset)?;

    let saved_to = if args.no_save {
        None
    } else {
        detector.save_model()?;
        Some(detector.models_dir().display().to_string())
    };

    let summary = TrainingSummary {
        model_type: report.model_type,
        accuracy: report.accuracy,
        n_train: report.n_train,
        n_test: report.n_test,
        vocabulary_size: report.vocabulary_size,
        degraded: report.degraded,
        duration_ms: report.duration.as_millis() as u64,
        saved_to,
        report: report.report,
    };

    output_result("Training completed", &summary, cli_args)
}

/// Classify one article.
fn predict_text(args: PredictArgs, config: DetectorConfig, cli_args: &VerityArgs) -> Result<()> {
    let mut text = read_text(&args.source)?;
    if args.sanitize {
        text = sanitize_text(&text, config.max_text_length);
    }

    let min_confidence = config.min_confidence;
    let detector = FakeNewsDetector::new(config)?;

    load_or_train(&detector, args.train_if_missing)?;

    let result = if args.no_validate {
        detector.predict(&text)?
    } else {
        detector.predict_validated(&text)?
    };

    let output = PredictionOutput {
        label: result.label,
        prediction: result.label.as_str().to_uppercase(),
        confidence: result.confidence,
        probability_real: result.probabilities[0],
        probability_fake: result.probabilities[1],
        confident: result.is_confident(min_confidence),
        warnings: check_text_quality(&text)
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    output_result("Prediction", &output, cli_args)
}

/// Load the saved model, training a new one only when none exists yet.
///
/// A saved model that fails to decode is reported, never silently replaced.
fn load_or_train(detector: &FakeNewsDetector, train_if_missing: bool) -> Result<()> {
    let Err(e) = detector.try_load_model() else {
        return Ok(());
    };
    if !train_if_missing || !e.is_recoverable_by_training() {
        return Err(e);
    }

    info!("No saved model ({e}); training a new one");
    if !detector.train() {
        return Err(VerityError::other(
            detector
                .last_error()
                .unwrap_or_else(|| "training failed".to_string()),
        ));
    }
    Ok(())
}

/// Show statistics and quality issues for a text.
fn show_stats(args: StatsArgs, cli_args: &VerityArgs) -> Result<()> {
    let text = read_text(&args.source)?;
    let report = TextReport {
        statistics: TextStatistics::from_text(&text),
        issues: check_text_quality(&text),
    };

    output_result("Text analysis", &report, cli_args)
}

/// Summarize the prediction log.
fn show_analytics(
    args: AnalyticsArgs,
    config: DetectorConfig,
    cli_args: &VerityArgs,
) -> Result<()> {
    if args.days <= 0 {
        return Err(VerityError::invalid_argument("--days must be positive"));
    }

    let log = AnalyticsLog::open(&config.analytics_file);
    let summary = AnalyticsSummary {
        total_records: log.len(),
        daily: log.daily_stats(args.days, Utc::now()),
        distribution: log.confidence_distribution(),
        performance: log.performance_metrics(),
    };

    output_result(
        &format!("Analytics from {}", config.analytics_file.display()),
        &summary,
        cli_args,
    )
}

/// Article text from the argument, a file, or stdin.
fn read_text(source: &TextSource) -> Result<String> {
    let text = match (&source.text, &source.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) if path != Path::new("-") => fs::read_to_string(path)?,
        (None, _) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if text.trim().is_empty() {
        return Err(VerityError::validation("no article text given"));
    }
    Ok(text)
}
