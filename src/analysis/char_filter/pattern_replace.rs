//! Regex replacement char filter.

use regex::Regex;

use super::CharFilter;
use crate::error::{Result, VerityError};

/// Pattern matching `http`, `https` and `www` prefixed runs up to the next whitespace.
pub const URL_PATTERN: &str = r"(?i)https?\S+|www\S+";

/// Pattern matching `@mentions` and `#hashtags`.
pub const HANDLE_PATTERN: &str = r"[@#]\w+";

/// A char filter that replaces every match of a regex pattern.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .map_err(|e| VerityError::analysis(format!("Invalid regex pattern: {e}")))?,
            replacement: replacement.to_string(),
        })
    }

    /// Filter removing URLs.
    pub fn urls() -> Result<Self> {
        Self::new(URL_PATTERN, "")
    }

    /// Filter removing `@mentions` and `#hashtags`.
    pub fn handles() -> Result<Self> {
        Self::new(HANDLE_PATTERN, "")
    }

    /// Get the regex pattern used by this filter.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}
