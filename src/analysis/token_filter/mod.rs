//! Token filter implementations for token transformation.
//!
//! Filters receive a token stream and return a new one, rewriting or
//! dropping tokens. The normalizer chains them in this order:
//!
//! ```text
//! Whitespace tokens → Lowercase → Stop words → (Lemmatizer, per-token policy)
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Wraps a token stream, rewriting or dropping tokens lazily.
pub trait Filter: Send + Sync {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Stable identifier, shown in analyzer debug output.
    fn name(&self) -> &'static str;
}

pub mod lowercase;
pub mod stem;
pub mod stop;

pub use lowercase::LowercaseFilter;
pub use stem::{NounLemmatizer, StemFilter, Stemmer};
pub use stop::StopFilter;
