//! Command line argument parsing for the Verity CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::ml::classifier::ModelType;

/// Verity - classify news articles as real or fake
#[derive(Parser, Debug, Clone)]
#[command(name = "verity")]
#[command(about = "Classify news articles as real or fake with a TF-IDF model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct VerityArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl VerityArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model and save it to the models directory
    Train(TrainArgs),

    /// Classify an article
    Predict(PredictArgs),

    /// Show text statistics and quality checks for an article
    Stats(StatsArgs),

    /// Summarize logged predictions
    Analytics(AnalyticsArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Dataset file (CSV, JSON or JSONL); defaults to <data_dir>/processed_news.csv
    #[arg(short, long, value_name = "DATASET")]
    pub dataset: Option<PathBuf>,

    /// Train on the built-in sample data instead of a dataset file
    #[arg(long, conflicts_with = "dataset")]
    pub sample_data: bool,

    /// Classifier: logistic_regression, random_forest or svm
    #[arg(short, long)]
    pub model_type: Option<ModelType>,

    /// Maximum vocabulary size
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Directory to save the model to
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Don't save the trained model
    #[arg(long)]
    pub no_save: bool,
}

/// Where the article text comes from.
#[derive(Parser, Debug, Clone)]
pub struct TextSource {
    /// Article text
    #[arg(value_name = "TEXT", conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the article from a file ("-" for stdin)
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub source: TextSource,

    /// Skip the length and word count checks
    #[arg(long)]
    pub no_validate: bool,

    /// Strip HTML before classifying
    #[arg(long)]
    pub sanitize: bool,

    /// Train on the configured dataset when no saved model exists
    #[arg(long)]
    pub train_if_missing: bool,
}

/// Arguments for text statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub source: TextSource,
}

/// Arguments for the analytics summary
#[derive(Parser, Debug, Clone)]
pub struct AnalyticsArgs {
    /// Window for daily statistics, in days
    #[arg(short, long, default_value = "7")]
    pub days: i64,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
