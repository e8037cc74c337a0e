//! Text analysis for news articles.
//!
//! This module provides the building blocks of the cleaning pipeline: char
//! filters that rewrite raw text, tokenizers, token filters, the analyzer
//! that chains them, and the [`TextNormalizer`](normalizer::TextNormalizer)
//! built on top.

pub mod analyzer;
pub mod char_filter;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use normalizer::{LemmatizePolicy, TextNormalizer};
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;
