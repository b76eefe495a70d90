//! Punctuation filter implementation.

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// A filter that deletes ASCII punctuation characters from every token.
///
/// The character set is ``!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~``. Tokens made
/// entirely of punctuation become empty and are marked as stopped.
#[derive(Clone, Debug, Default)]
pub struct PunctuationFilter;

impl PunctuationFilter {
    /// Create a new punctuation filter.
    pub fn new() -> Self {
        PunctuationFilter
    }

    /// Remove ASCII punctuation from a string.
    pub fn strip(text: &str) -> String {
        text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
    }
}

impl Filter for PunctuationFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.map(|token| {
            if token.is_stopped() || !token.text.chars().any(|c| c.is_ascii_punctuation()) {
                return token;
            }
            let stripped = Self::strip(&token.text);
            if stripped.is_empty() {
                token.with_text(stripped).stop()
            } else {
                token.with_text(stripped)
            }
        })))
    }

    fn name(&self) -> &'static str {
        "punctuation"
    }
}
