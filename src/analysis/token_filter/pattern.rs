//! Regex deletion filter operating on individual tokens.

use regex::Regex;

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::{Result, VerityError};

/// A filter that deletes every match of a regex pattern from each token.
///
/// Tokens left empty are marked as stopped.
#[derive(Clone, Debug)]
pub struct PatternFilter {
    pattern: Regex,
}

impl PatternFilter {
    /// Create a new pattern filter.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .map_err(|e| VerityError::analysis(format!("Invalid regex pattern: {e}")))?,
        })
    }
}

impl Filter for PatternFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let pattern = self.pattern.clone();
        Ok(Box::new(tokens.map(move |token| {
            if token.is_stopped() || !pattern.is_match(&token.text) {
                return token;
            }
            let replaced = pattern.replace_all(&token.text, "").into_owned();
            if replaced.is_empty() {
                token.with_text(replaced).stop()
            } else {
                token.with_text(replaced)
            }
        })))
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}
