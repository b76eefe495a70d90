//! Text analysis module for Verity.
//!
//! Provides the tokenizers, char filters, token filters and analyzers that
//! turn raw article text into normalized tokens, plus descriptive text
//! statistics.

pub mod analyzer;
pub mod char_filter;
pub mod stats;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, NewsAnalyzer, PipelineAnalyzer};
pub use stats::TextStatistics;
pub use token::{Token, TokenStream};
