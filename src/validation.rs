//! Input validation and cleanup for article text.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::error::{Result, VerityError};

static SCRIPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script.*?</script>").expect("script pattern is valid"));
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("tag pattern is valid"));

/// Word count below which results are flagged as less reliable.
const SHORT_TEXT_WORDS: usize = 20;

/// Length limits applied to text submitted for prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    pub min_text_length: usize,
    pub max_text_length: usize,
    pub min_word_count: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        InputLimits::from(&DetectorConfig::default())
    }
}

impl From<&DetectorConfig> for InputLimits {
    fn from(config: &DetectorConfig) -> Self {
        InputLimits {
            min_text_length: config.min_text_length,
            max_text_length: config.max_text_length,
            min_word_count: config.min_word_count,
        }
    }
}

/// Check that `text` is long enough, not too long, and has enough words.
///
/// Lengths are counted in characters; the minimum applies to the trimmed text.
pub fn validate_input(text: &str, limits: &InputLimits) -> Result<()> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VerityError::validation("text is empty"));
    }

    let length = trimmed.chars().count();
    if length < limits.min_text_length {
        return Err(VerityError::validation(format!(
            "text is too short: {length} characters, need at least {}",
            limits.min_text_length
        )));
    }

    let total = text.chars().count();
    if total > limits.max_text_length {
        return Err(VerityError::validation(format!(
            "text is too long: {total} characters, at most {} allowed",
            limits.max_text_length
        )));
    }

    let words = text.split_whitespace().count();
    if words < limits.min_word_count {
        return Err(VerityError::validation(format!(
            "text has {words} words, need at least {}",
            limits.min_word_count
        )));
    }

    Ok(())
}

/// Strip `<script>` blocks and HTML tags, cap the length, and trim.
pub fn sanitize_text(text: &str, max_text_length: usize) -> String {
    let without_scripts = SCRIPT_REGEX.replace_all(text, "");
    let without_tags = TAG_REGEX.replace_all(&without_scripts, "");

    let truncated = match without_tags.char_indices().nth(max_text_length) {
        Some((byte_idx, _)) => &without_tags[..byte_idx],
        None => &without_tags[..],
    };
    truncated.trim().to_string()
}

/// A property of the text that makes predictions less reliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    VeryShort,
    RepeatedWords,
    AllUppercase,
    NoAlphabetic,
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            QualityIssue::VeryShort => "Text is very short - results may be less accurate",
            QualityIssue::RepeatedWords => "Text has many repeated words",
            QualityIssue::AllUppercase => "Text is all uppercase",
            QualityIssue::NoAlphabetic => "Text contains no alphabetic characters",
        };
        f.write_str(message)
    }
}

/// List the quality issues of `text`, if any.
pub fn check_text_quality(text: &str) -> Vec<QualityIssue> {
    let mut issues = Vec::new();
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.len() < SHORT_TEXT_WORDS {
        issues.push(QualityIssue::VeryShort);
    }

    if !words.is_empty() {
        let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
        if (unique.len() as f64) / (words.len() as f64) < 0.5 {
            issues.push(QualityIssue::RepeatedWords);
        }
    }

    let has_cased = text.chars().any(|c| c.is_uppercase() || c.is_lowercase());
    if has_cased && !text.chars().any(char::is_lowercase) {
        issues.push(QualityIssue::AllUppercase);
    }

    if !text.chars().any(char::is_alphabetic) {
        issues.push(QualityIssue::NoAlphabetic);
    }

    issues
}
