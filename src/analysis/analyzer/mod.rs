//! Analyzers combine char filters, a tokenizer and token filters.
//!
//! ```text
//! Raw Text → Char Filters → Tokenizer → Filter 1 → ... → Filter N → Tokens
//! ```

mod pipeline;

pub use pipeline::PipelineAnalyzer;

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Turns raw text into a token stream.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    fn name(&self) -> &str;
}
