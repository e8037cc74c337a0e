//! Word reduction.
//!
//! A [`Stemmer`] maps one word to its base form. [`StemFilter`] applies a
//! shared stemmer to every token of a stream.

use std::sync::Arc;

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod lemmatizer;

pub use lemmatizer::NounLemmatizer;

/// Trait for word reduction algorithms.
pub trait Stemmer: Send + Sync {
    /// Reduce a word to its base form.
    fn stem(&self, word: &str) -> String;

    /// Get the name of this stemmer.
    fn name(&self) -> &'static str;
}

/// Filter that applies a [`Stemmer`] to every token.
#[derive(Clone)]
pub struct StemFilter {
    stemmer: Arc<dyn Stemmer>,
}

impl StemFilter {
    /// Stem with the noun lemmatizer.
    pub fn new() -> Self {
        Self::with_stemmer(Arc::new(NounLemmatizer::new()))
    }

    pub fn with_stemmer(stemmer: Arc<dyn Stemmer>) -> Self {
        StemFilter { stemmer }
    }

    pub fn stemmer_name(&self) -> &'static str {
        self.stemmer.name()
    }
}

impl Default for StemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StemFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StemFilter").field(&self.stemmer.name()).finish()
    }
}

impl Filter for StemFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let stemmer = Arc::clone(&self.stemmer);
        Ok(Box::new(tokens.map(move |token| {
            let stemmed = stemmer.stem(&token.text);
            token.with_text(stemmed)
        })))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    struct Upper;

    impl Stemmer for Upper {
        fn stem(&self, word: &str) -> String {
            word.to_uppercase()
        }

        fn name(&self) -> &'static str {
            "upper"
        }
    }

    #[test]
    fn test_stem_filter() {
        let filter = StemFilter::new();
        let tokens = vec![
            Token::new("senators", 0),
            Token::new("flies", 1),
            Token::new("movies", 2),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0], Token::new("senator", 0));
        assert_eq!(result[1].text, "fly");
        assert_eq!(result[2].text, "movie");
    }

    #[test]
    fn test_custom_stemmer() {
        let filter = StemFilter::with_stemmer(Arc::new(Upper));
        let tokens = vec![Token::new("hoax", 0)];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result[0].text, "HOAX");
        assert_eq!(filter.stemmer_name(), "upper");
        assert_eq!(filter.name(), "stem");
    }
}
