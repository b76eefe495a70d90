//! Prediction history and usage statistics.
//!
//! Every prediction made through the detector can be appended to an
//! [`AnalyticsLog`], which persists as JSON and answers simple questions
//! about recent usage: daily volume, the confidence distribution, and how
//! often predictions are fake or low-confidence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dataset::Label;
use crate::error::Result;
use crate::model::PredictionResult;

/// Number of records needed before performance metrics are reported.
pub const MIN_RECORDS_FOR_METRICS: usize = 10;

const HIGH_CONFIDENCE: f64 = 0.8;
const LOW_CONFIDENCE: f64 = 0.6;
const HISTOGRAM_BINS: usize = 10;

/// One logged prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub timestamp: DateTime<Utc>,
    pub label: Label,
    pub confidence: f64,
    pub text_length: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AnalyticsData {
    #[serde(default)]
    predictions: Vec<PredictionRecord>,
}

/// Aggregates over a recent window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub total_analyses: usize,
    pub fake_count: usize,
    pub real_count: usize,
    pub avg_confidence: f64,
    pub avg_text_length: f64,
    /// Predictions per calendar day (UTC).
    pub daily_breakdown: BTreeMap<NaiveDate, usize>,
}

/// Confidence histogram over `[0, 1]` in ten equal bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceHistogram {
    /// Bin edges, `HISTOGRAM_BINS + 1` values from 0.0 to 1.0.
    pub bins: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Usage metrics over the whole log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_predictions: usize,
    pub fake_news_rate: f64,
    pub real_news_rate: f64,
    /// Mean confidence of fake predictions; `None` when there are none.
    pub avg_confidence_fake: Option<f64>,
    pub avg_confidence_real: Option<f64>,
    /// Share of predictions with confidence above 0.8.
    pub high_confidence_rate: f64,
    /// Share of predictions with confidence below 0.6.
    pub low_confidence_rate: f64,
}

/// Append-only log of predictions, optionally backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsLog {
    path: Option<PathBuf>,
    data: AnalyticsData,
}

impl AnalyticsLog {
    /// A log that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the log at `path`. A missing or unreadable file starts an empty log.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable analytics file {}: {e}", path.display());
                AnalyticsData::default()
            }),
            Err(_) => AnalyticsData::default(),
        };
        debug!(
            "Opened analytics log {} with {} records",
            path.display(),
            data.predictions.len()
        );
        AnalyticsLog {
            path: Some(path),
            data,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.data.predictions
    }

    pub fn len(&self) -> usize {
        self.data.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.predictions.is_empty()
    }

    /// Log a prediction made now and persist the log.
    pub fn record(&mut self, result: &PredictionResult, text_length: usize) -> Result<()> {
        self.record_at(Utc::now(), result, text_length)
    }

    /// Log a prediction with an explicit timestamp and persist the log.
    pub fn record_at(
        &mut self,
        timestamp: DateTime<Utc>,
        result: &PredictionResult,
        text_length: usize,
    ) -> Result<()> {
        self.data.predictions.push(PredictionRecord {
            timestamp,
            label: result.label,
            confidence: result.confidence,
            text_length,
        });
        self.save()
    }

    /// Write the log to its file, if it has one.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&self.data)?)?;
        Ok(())
    }

    /// Statistics for records newer than `days` days before `now`.
    ///
    /// A window reaching past the representable date range covers every record.
    pub fn daily_stats(&self, days: i64, now: DateTime<Utc>) -> Option<DailyStats> {
        let cutoff = Duration::try_days(days).and_then(|window| now.checked_sub_signed(window));
        let recent: Vec<&PredictionRecord> = self
            .data
            .predictions
            .iter()
            .filter(|r| cutoff.is_none_or(|cutoff| r.timestamp > cutoff))
            .collect();
        if recent.is_empty() {
            return None;
        }

        let total = recent.len();
        let fake_count = recent.iter().filter(|r| r.label == Label::Fake).count();
        let mut daily_breakdown = BTreeMap::new();
        for record in &recent {
            *daily_breakdown
                .entry(record.timestamp.date_naive())
                .or_insert(0) += 1;
        }

        Some(DailyStats {
            total_analyses: total,
            fake_count,
            real_count: total - fake_count,
            avg_confidence: mean(recent.iter().map(|r| r.confidence)).unwrap_or(0.0),
            avg_text_length: mean(recent.iter().map(|r| r.text_length as f64)).unwrap_or(0.0),
            daily_breakdown,
        })
    }

    /// Histogram of confidences; the last bin includes 1.0.
    pub fn confidence_distribution(&self) -> Option<ConfidenceHistogram> {
        if self.is_empty() {
            return None;
        }

        let bins: Vec<f64> = (0..=HISTOGRAM_BINS)
            .map(|i| i as f64 / HISTOGRAM_BINS as f64)
            .collect();
        let mut counts = vec![0; HISTOGRAM_BINS];
        for record in &self.data.predictions {
            if !(0.0..=1.0).contains(&record.confidence) {
                continue;
            }
            let bin = ((record.confidence * HISTOGRAM_BINS as f64) as usize).min(HISTOGRAM_BINS - 1);
            counts[bin] += 1;
        }

        Some(ConfidenceHistogram { bins, counts })
    }

    /// Usage metrics, once at least [`MIN_RECORDS_FOR_METRICS`] predictions exist.
    pub fn performance_metrics(&self) -> Option<PerformanceMetrics> {
        let records = &self.data.predictions;
        if records.len() < MIN_RECORDS_FOR_METRICS {
            return None;
        }

        let total = records.len() as f64;
        let rate = |pred: &dyn Fn(&PredictionRecord) -> bool| {
            records.iter().filter(|r| pred(r)).count() as f64 / total
        };
        let mean_for = |label: Label| {
            mean(
                records
                    .iter()
                    .filter(|r| r.label == label)
                    .map(|r| r.confidence),
            )
        };

        Some(PerformanceMetrics {
            total_predictions: records.len(),
            fake_news_rate: rate(&|r| r.label == Label::Fake),
            real_news_rate: rate(&|r| r.label == Label::Real),
            avg_confidence_fake: mean_for(Label::Fake),
            avg_confidence_real: mean_for(Label::Real),
            high_confidence_rate: rate(&|r| r.confidence > HIGH_CONFIDENCE),
            low_confidence_rate: rate(&|r| r.confidence < LOW_CONFIDENCE),
        })
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
