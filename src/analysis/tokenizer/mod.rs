//! Tokenizer implementations for text analysis.
//!
//! - [`WhitespaceTokenizer`] splits on whitespace; it drives the normalizer
//!   and the vocabulary.
//! - [`RegexTokenizer`] extracts pattern matches; the explorer uses it with
//!   the count-vectorizer word pattern for n-gram statistics.
//! - [`UnicodeWordTokenizer`] splits on Unicode word boundaries and can keep
//!   punctuation as separate tokens, for article length statistics.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Splits char-filtered text into positioned tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Stable identifier, shown in analyzer names and debug output.
    fn name(&self) -> &'static str;
}

pub mod regex;
pub mod unicode_word;
pub mod whitespace;

pub use regex::RegexTokenizer;
pub use unicode_word::UnicodeWordTokenizer;
pub use whitespace::WhitespaceTokenizer;
