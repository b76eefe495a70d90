//! Descriptive statistics over raw article text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z0-9$\-_@.&+!*(),]|%[0-9a-fA-F]{2})+")
        .expect("URL pattern is valid")
});

/// Surface statistics of a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStatistics {
    pub characters: usize,
    pub words: usize,
    /// Non-blank segments between `.`, `!` and `?` runs.
    pub sentences: usize,
    pub avg_words_per_sentence: f64,
    pub urls: usize,
    pub exclamations: usize,
    pub questions: usize,
    pub uppercase: usize,
    pub uppercase_ratio: f64,
}

impl TextStatistics {
    /// Compute statistics for `text`.
    pub fn from_text(text: &str) -> Self {
        let characters = text.chars().count();
        let words = text.split_whitespace().count();
        let sentences = count_sentences(text);
        let uppercase = text.chars().filter(|c| c.is_uppercase()).count();

        TextStatistics {
            characters,
            words,
            sentences,
            avg_words_per_sentence: words as f64 / sentences.max(1) as f64,
            urls: extract_urls(text).len(),
            exclamations: text.matches('!').count(),
            questions: text.matches('?').count(),
            uppercase,
            uppercase_ratio: uppercase as f64 / characters.max(1) as f64,
        }
    }
}

/// Extract `http://` and `https://` URLs from text.
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}

fn count_sentences(text: &str) -> usize {
    match RegexTokenizer::with_gaps(r"[.!?]+").and_then(|t| t.tokenize(text)) {
        Ok(segments) => segments.filter(|s| !s.text.trim().is_empty()).count(),
        Err(_) => 0,
    }
}
