//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::analysis::stats::TextStatistics;
use crate::analytics::{ConfidenceHistogram, DailyStats, PerformanceMetrics};
use crate::cli::args::{OutputFormat, VerityArgs};
use crate::dataset::Label;
use crate::error::Result;
use crate::ml::classifier::ModelType;
use crate::ml::metrics::ClassificationReport;
use crate::model::format_confidence;
use crate::validation::QualityIssue;

/// Result structure for a training run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub model_type: ModelType,
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub vocabulary_size: usize,
    pub degraded: bool,
    pub duration_ms: u64,
    pub saved_to: Option<String>,
    pub report: ClassificationReport,
}

/// Result structure for a single classification.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub label: Label,
    pub prediction: String,
    pub confidence: f64,
    pub probability_real: f64,
    pub probability_fake: f64,
    pub confident: bool,
    pub warnings: Vec<String>,
}

/// Result structure for text statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct TextReport {
    pub statistics: TextStatistics,
    pub issues: Vec<QualityIssue>,
}

/// Result structure for the analytics summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_records: usize,
    pub daily: Option<DailyStats>,
    pub distribution: Option<ConfidenceHistogram>,
    pub performance: Option<PerformanceMetrics>,
}

/// Values that know how to print themselves for people.
pub trait HumanOutput {
    fn print_human(&self);
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &VerityArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &VerityArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl HumanOutput for TrainingSummary {
    fn print_human(&self) {
        println!("Training Results:");
        println!("═════════════════");
        println!("Model: {}", self.model_type);
        println!("Accuracy: {:.4}", self.accuracy);
        println!("Train/test split: {}/{}", self.n_train, self.n_test);
        println!("Vocabulary size: {}", self.vocabulary_size);
        println!("Training time: {}ms", self.duration_ms);
        if self.degraded {
            println!("Note: trained on built-in sample data, not a real dataset");
        }
        match &self.saved_to {
            Some(dir) => println!("Saved to: {dir}"),
            None => println!("Model not saved"),
        }
        println!();
        println!("{}", self.report);
    }
}

impl HumanOutput for PredictionOutput {
    fn print_human(&self) {
        println!("Prediction: {}", self.prediction);
        println!("Confidence: {}", format_confidence(self.confidence));
        println!(
            "Probabilities: real {:.3}, fake {:.3}",
            self.probability_real, self.probability_fake
        );
        if !self.confident {
            println!("Low confidence: treat this result with caution");
        }
        for warning in &self.warnings {
            println!("Warning: {warning}");
        }
    }
}

impl HumanOutput for TextReport {
    fn print_human(&self) {
        let s = &self.statistics;
        println!("Text Statistics:");
        println!("════════════════");
        println!("Characters: {}", s.characters);
        println!("Words: {}", s.words);
        println!("Sentences: {}", s.sentences);
        println!("Average words per sentence: {:.1}", s.avg_words_per_sentence);
        println!("URLs: {}", s.urls);
        println!("Exclamation marks: {}", s.exclamations);
        println!("Question marks: {}", s.questions);
        println!("Uppercase ratio: {:.1}%", s.uppercase_ratio * 100.0);

        if !self.issues.is_empty() {
            println!();
            println!("Quality Issues:");
            println!("───────────────");
            for issue in &self.issues {
                println!("  {issue}");
            }
        }
    }
}

impl HumanOutput for AnalyticsSummary {
    fn print_human(&self) {
        println!("Prediction Analytics:");
        println!("═════════════════════");
        println!("Logged predictions: {}", self.total_records);

        if let Some(daily) = &self.daily {
            println!();
            println!("Recent Activity:");
            println!("────────────────");
            println!("Analyses: {}", daily.total_analyses);
            println!("Fake: {}, real: {}", daily.fake_count, daily.real_count);
            println!("Average confidence: {}", format_confidence(daily.avg_confidence));
            println!("Average text length: {:.0}", daily.avg_text_length);
            for (day, count) in &daily.daily_breakdown {
                println!("  {day}: {count}");
            }
        }

        if let Some(histogram) = &self.distribution {
            println!();
            println!("Confidence Distribution:");
            println!("────────────────────────");
            for (edges, count) in histogram.bins.windows(2).zip(&histogram.counts) {
                println!("  {:.1}-{:.1}: {count}", edges[0], edges[1]);
            }
        }

        if let Some(performance) = &self.performance {
            println!();
            println!("Performance:");
            println!("────────────");
            println!("Fake news rate: {:.1}%", performance.fake_news_rate * 100.0);
            println!("Real news rate: {:.1}%", performance.real_news_rate * 100.0);
            println!(
                "High confidence rate: {:.1}%",
                performance.high_confidence_rate * 100.0
            );
            println!(
                "Low confidence rate: {:.1}%",
                performance.low_confidence_rate * 100.0
            );
        }
    }
}
