//! Labeled news articles and the datasets they are trained from.
//!
//! Datasets load from CSV (`text` or `full_text`, `label`, optional `title`
//! columns), a JSON array, or JSON Lines. When no dataset is available, a
//! small built-in synthetic set can stand in; it is marked
//! [`DatasetSource::Fallback`] so callers can tell the resulting model is not
//! production quality.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};

/// Class label of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Label {
    Real = 0,
    Fake = 1,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Real, Label::Fake];

    /// Position of this class in a probability pair.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_f64(self) -> f64 {
        self as i64 as f64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Real => "real",
            Label::Fake => "fake",
        }
    }

    /// Argmax of `[P(real), P(fake)]`; ties go to `Real`.
    pub fn from_probabilities(probabilities: &[f64; 2]) -> Self {
        if probabilities[1] > probabilities[0] {
            Label::Fake
        } else {
            Label::Real
        }
    }
}

impl From<Label> for i64 {
    fn from(label: Label) -> Self {
        label as i64
    }
}

impl TryFrom<i64> for Label {
    type Error = VerityError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Label::Real),
            1 => Ok(Label::Fake),
            other => Err(VerityError::dataset(format!(
                "label must be 0 (real) or 1 (fake), got {other}"
            ))),
        }
    }
}

impl FromStr for Label {
    type Err = VerityError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "real" => return Ok(Label::Real),
            "fake" => return Ok(Label::Fake),
            _ => {}
        }
        if let Ok(value) = s.parse::<i64>() {
            return Label::try_from(value);
        }
        // Float-typed label columns such as "1.0"
        match s.parse::<f64>() {
            Ok(value) if value == 0.0 => Ok(Label::Real),
            Ok(value) if value == 1.0 => Ok(Label::Fake),
            _ => Err(VerityError::dataset(format!("invalid label '{s}'"))),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A news article, optionally labeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(alias = "full_text")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

impl Article {
    /// Create an unlabeled article.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Article {
            title: None,
            text: text.into(),
            label: None,
        }
    }

    /// Create a labeled article.
    pub fn labeled<S: Into<String>>(text: S, label: Label) -> Self {
        Article {
            title: None,
            text: text.into(),
            label: Some(label),
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title and text joined by a space; just the text when there is no title.
    pub fn full_text(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => format!("{title} {}", self.text),
            _ => self.text.clone(),
        }
    }
}

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetSource {
    /// Loaded from a file.
    File(PathBuf),
    /// Built in code by the caller.
    InMemory,
    /// The built-in synthetic set. Not representative of real news.
    Fallback,
}

/// A set of labeled articles.
#[derive(Debug, Clone)]
pub struct Dataset {
    articles: Vec<Article>,
    source: DatasetSource,
}

const FALLBACK_SAMPLES: [(&str, Label); 12] = [
    ("Scientists discover breakthrough in renewable energy technology", Label::Real),
    ("Local government announces new infrastructure project funding", Label::Real),
    ("Stock market shows steady growth amid economic uncertainty", Label::Real),
    ("University researchers publish peer-reviewed climate study", Label::Real),
    ("Hospital reports successful treatment of rare disease", Label::Real),
    ("Technology company releases quarterly earnings report", Label::Real),
    ("Breaking: Aliens landed in downtown area yesterday evening", Label::Fake),
    ("Miracle cure discovered that eliminates all diseases overnight", Label::Fake),
    ("Politicians secretly planning to control weather patterns globally", Label::Fake),
    ("New diet allows you to lose 50 pounds in just 3 days", Label::Fake),
    ("Scientists prove that the earth is actually flat after all", Label::Fake),
    ("Magic crystals can cure cancer according to new study", Label::Fake),
];

const FALLBACK_REPEATS: usize = 50;

impl Dataset {
    /// Build a dataset from labeled articles.
    pub fn new(articles: Vec<Article>) -> Result<Self> {
        Self::with_source(articles, DatasetSource::InMemory)
    }

    fn with_source(articles: Vec<Article>, source: DatasetSource) -> Result<Self> {
        if let Some(row) = articles.iter().position(|a| a.label.is_none()) {
            return Err(VerityError::dataset(format!("article {row} has no label")));
        }
        Ok(Dataset { articles, source })
    }

    /// The built-in synthetic dataset: 12 headlines repeated 50 times.
    pub fn fallback() -> Self {
        let articles = (0..FALLBACK_REPEATS)
            .flat_map(|_| FALLBACK_SAMPLES.iter())
            .map(|&(text, label)| Article::labeled(text, label))
            .collect();

        Dataset {
            articles,
            source: DatasetSource::Fallback,
        }
    }

    /// Load a dataset, choosing the format from the file extension.
    ///
    /// `.json` is a JSON array, `.jsonl`/`.ndjson` is JSON Lines, anything
    /// else is read as CSV.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let articles = match extension.as_deref() {
            Some("json") => read_json(BufReader::new(file))?,
            Some("jsonl") | Some("ndjson") => read_jsonl(BufReader::new(file))?,
            _ => read_csv(file)?,
        };

        if articles.is_empty() {
            return Err(VerityError::dataset(format!(
                "no rows in {}",
                path.display()
            )));
        }

        Self::with_source(articles, DatasetSource::File(path.to_path_buf()))
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DatasetSource::Fallback
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Labels in row order.
    pub fn labels(&self) -> Vec<Label> {
        self.articles
            .iter()
            .map(|a| a.label.unwrap_or(Label::Real))
            .collect()
    }

    /// Full texts (title and body) in row order.
    pub fn texts(&self) -> Vec<String> {
        self.articles.iter().map(Article::full_text).collect()
    }

    /// Number of `[real, fake]` rows.
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0; 2];
        for label in self.articles.iter().filter_map(|a| a.label) {
            counts[label.index()] += 1;
        }
        counts
    }
}

/// Read articles from CSV with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Article>> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    // A precomputed `full_text` already contains the title.
    let (text_col, title_col) = match column("full_text") {
        Some(idx) => (idx, None),
        None => (
            column("text")
                .ok_or_else(|| VerityError::dataset("CSV needs a 'text' or 'full_text' column"))?,
            column("title"),
        ),
    };
    let label_col =
        column("label").ok_or_else(|| VerityError::dataset("CSV needs a 'label' column"))?;

    let mut articles = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| {
            record.get(idx).ok_or_else(|| {
                VerityError::dataset(format!("row {}: missing column {idx}", row + 1))
            })
        };

        let label = field(label_col)?
            .parse::<Label>()
            .map_err(|e| VerityError::dataset(format!("row {}: {e}", row + 1)))?;
        let title = match title_col {
            Some(idx) => record
                .get(idx)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            None => None,
        };

        articles.push(Article {
            title,
            text: field(text_col)?.to_string(),
            label: Some(label),
        });
    }

    Ok(articles)
}

/// Read articles from a JSON array.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<Article>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read articles from JSON Lines, skipping blank lines.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<Article>> {
    let mut articles = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let article = serde_json::from_str(trimmed).map_err(|e| {
            VerityError::dataset(format!("line {}: invalid JSON: {e}", line_no + 1))
        })?;
        articles.push(article);
    }
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_label_conversions() {
        assert_eq!(Label::try_from(0i64).unwrap(), Label::Real);
        assert_eq!(Label::try_from(1i64).unwrap(), Label::Fake);
        assert!(Label::try_from(2i64).is_err());
        assert_eq!(i64::from(Label::Fake), 1);

        assert_eq!("FAKE".parse::<Label>().unwrap(), Label::Fake);
        assert_eq!(" 0 ".parse::<Label>().unwrap(), Label::Real);
        assert_eq!("1.0".parse::<Label>().unwrap(), Label::Fake);
        assert!("0.5".parse::<Label>().is_err());
        assert!("maybe".parse::<Label>().is_err());
    }

    #[test]
    fn test_label_from_probabilities_ties_go_to_real() {
        assert_eq!(Label::from_probabilities(&[0.5, 0.5]), Label::Real);
        assert_eq!(Label::from_probabilities(&[0.4, 0.6]), Label::Fake);
        assert_eq!(Label::from_probabilities(&[0.9, 0.1]), Label::Real);
    }

    #[test]
    fn test_label_serde_as_integer() {
        assert_eq!(serde_json::to_string(&Label::Fake).unwrap(), "1");
        let label: Label = serde_json::from_str("0").unwrap();
        assert_eq!(label, Label::Real);
        assert!(serde_json::from_str::<Label>("3").is_err());
    }

    #[test]
    fn test_full_text() {
        let article = Article::labeled("Body text.", Label::Real).with_title("Headline");
        assert_eq!(article.full_text(), "Headline Body text.");

        let article = Article::new("Body only").with_title("  ");
        assert_eq!(article.full_text(), "Body only");
    }

    #[test]
    fn test_fallback_dataset() {
        let dataset = Dataset::fallback();
        assert_eq!(dataset.len(), 600);
        assert_eq!(dataset.class_counts(), [300, 300]);
        assert!(dataset.is_fallback());
    }

    #[test]
    fn test_new_rejects_unlabeled_articles() {
        let err = Dataset::new(vec![
            Article::labeled("a", Label::Real),
            Article::new("b"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("article 1 has no label"));
    }

    #[test]
    fn test_read_csv_with_title() {
        let csv = "title,text,label\nHeadline,\"Body, with comma\",1\n,No title,0\n";
        let articles = read_csv(Cursor::new(csv)).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].full_text(), "Headline Body, with comma");
        assert_eq!(articles[0].label, Some(Label::Fake));
        assert_eq!(articles[1].title, None);
        assert_eq!(articles[1].label, Some(Label::Real));
    }

    #[test]
    fn test_read_csv_prefers_full_text() {
        let csv = "title,full_text,label\nIgnored,Already joined text,0\n";
        let articles = read_csv(Cursor::new(csv)).unwrap();
        assert_eq!(articles[0].full_text(), "Already joined text");
    }

    #[test]
    fn test_read_csv_errors() {
        assert!(read_csv(Cursor::new("body,label\nx,0\n")).is_err());
        assert!(read_csv(Cursor::new("text\nx\n")).is_err());

        let err = read_csv(Cursor::new("text,label\nx,7\n")).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_read_json_and_jsonl() {
        let json = r#"[{"title": "T", "text": "Body", "label": 1}, {"full_text": "Other", "label": 0}]"#;
        let articles = read_json(Cursor::new(json)).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].text, "Other");

        let jsonl = "{\"text\": \"One\", \"label\": 0}\n\n{\"text\": \"Two\", \"label\": 1}\n";
        let articles = read_jsonl(Cursor::new(jsonl)).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].label, Some(Label::Fake));

        assert!(read_jsonl(Cursor::new("{not json}\n")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("processed_news.csv");
        std::fs::write(&path, "text,label\nfirst,0\nsecond,1\n").unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels(), vec![Label::Real, Label::Fake]);
        assert_eq!(dataset.source(), &DatasetSource::File(path.clone()));

        let empty = temp_dir.path().join("empty.csv");
        std::fs::write(&empty, "text,label\n").unwrap();
        assert!(Dataset::load(&empty).is_err());

        assert!(Dataset::load(temp_dir.path().join("missing.csv")).is_err());
    }
}
