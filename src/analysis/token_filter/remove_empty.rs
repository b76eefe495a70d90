//! Remove empty filter implementation.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that removes empty tokens and stopped tokens from the stream.
///
/// Typically placed at the end of a pipeline to clean up tokens emptied or
/// stopped by previous filters.
#[derive(Clone, Debug, Default)]
pub struct RemoveEmptyFilter;

impl RemoveEmptyFilter {
    /// Create a new remove empty filter.
    pub fn new() -> Self {
        RemoveEmptyFilter
    }
}

impl Filter for RemoveEmptyFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(
            tokens.filter(|token| !token.is_empty() && !token.is_stopped()),
        ))
    }

    fn name(&self) -> &'static str {
        "remove_empty"
    }
}
