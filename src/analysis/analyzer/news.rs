//! Normalizer for news article text.
//!
//! The [`NewsAnalyzer`] turns raw article text into the lowercase, stopword
//! free token sequence the vectorizer is fitted on:
//!
//! 1. remove `http…`, `https…` and `www…` runs
//! 2. remove `@mentions` and `#hashtags`
//! 3. split on whitespace
//! 4. lowercase
//! 5. delete ASCII punctuation inside tokens
//! 6. delete URL-shaped residue that punctuation removal may have produced
//! 7. drop English stop words and empty tokens
//!
//! The result is a fixed point: normalizing normalized text changes nothing.
//!
//! # Examples
//!
//! ```
//! use verity::analysis::analyzer::news::NewsAnalyzer;
//!
//! let analyzer = NewsAnalyzer::new().unwrap();
//! assert_eq!(
//!     analyzer.normalize("BREAKING: Read https://t.co/x via @someone #fake!"),
//!     "breaking read"
//! );
//! ```

use std::sync::Arc;

use log::warn;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::char_filter::pattern_replace::{PatternReplaceCharFilter, URL_PATTERN};
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::pattern::PatternFilter;
use crate::analysis::token_filter::punctuation::PunctuationFilter;
use crate::analysis::token_filter::remove_empty::RemoveEmptyFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::whitespace::WhitespaceTokenizer;
use crate::error::Result;

/// Analyzer that normalizes news article text.
#[derive(Clone, Debug)]
pub struct NewsAnalyzer {
    inner: PipelineAnalyzer,
}

impl NewsAnalyzer {
    /// Create the article normalizer with the English stop word list.
    pub fn new() -> Result<Self> {
        Self::with_stop_filter(StopFilter::new())
    }

    /// Create the article normalizer with a custom stop filter.
    pub fn with_stop_filter(stop_filter: StopFilter) -> Result<Self> {
        let inner = PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::urls()?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::handles()?))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(PunctuationFilter::new()))
            .add_filter(Arc::new(PatternFilter::new(URL_PATTERN)?))
            .add_filter(Arc::new(RemoveEmptyFilter::new()))
            .add_filter(Arc::new(stop_filter))
            .add_filter(Arc::new(RemoveEmptyFilter::new()));

        Ok(Self { inner })
    }

    /// Normalize text into a single space-separated string of tokens.
    ///
    /// Never fails; an analysis error yields an empty string.
    pub fn normalize(&self, text: &str) -> String {
        match self.tokens(text) {
            Ok(tokens) => tokens.join(" "),
            Err(e) => {
                warn!("Normalization failed, returning empty text: {e}");
                String::new()
            }
        }
    }

    /// Normalize a batch of texts.
    pub fn normalize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }

    /// Analyze text and collect the token texts.
    pub fn tokens(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.inner.analyze(text)?.map(|token| token.text).collect())
    }
}

impl Analyzer for NewsAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "news"
    }
}
