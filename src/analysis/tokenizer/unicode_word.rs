//! Unicode word tokenizer implementation.
//!
//! Splits text on Unicode word boundaries (UAX #29). By default only word
//! segments are kept; with [`UnicodeWordTokenizer::keep_punctuation`] every
//! non-whitespace segment becomes a token, so `"news, today"` yields
//! `["news", ",", "today"]`. That mode is what article word counts use.
//!
//! # Examples
//!
//! ```
//! use verity::analysis::tokenizer::Tokenizer;
//! use verity::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//!
//! let tokenizer = UnicodeWordTokenizer::new().keep_punctuation(true);
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
//! assert_eq!(tokens.len(), 4);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer {
    keep_punctuation: bool,
}

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer that keeps only word segments.
    pub fn new() -> Self {
        UnicodeWordTokenizer {
            keep_punctuation: false,
        }
    }

    /// Keep punctuation segments as their own tokens.
    pub fn keep_punctuation(mut self, keep: bool) -> Self {
        self.keep_punctuation = keep;
        self
    }

    /// Count tokens without materializing them.
    pub fn count(&self, text: &str) -> usize {
        if self.keep_punctuation {
            text.split_word_bounds()
                .filter(|segment| !segment.chars().all(char::is_whitespace))
                .count()
        } else {
            text.unicode_words().count()
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = if self.keep_punctuation {
            text.split_word_bounds()
                .filter(|segment| !segment.chars().all(char::is_whitespace))
                .enumerate()
                .map(|(position, segment)| Token::new(segment, position))
                .collect()
        } else {
            text.unicode_words()
                .enumerate()
                .map(|(position, word)| Token::new(word, position))
                .collect()
        };

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_only() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<String> = tokenizer
            .tokenize("trump, clinton: debate!")
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(tokens, vec!["trump", "clinton", "debate"]);
    }

    #[test]
    fn test_keep_punctuation() {
        let tokenizer = UnicodeWordTokenizer::new().keep_punctuation(true);
        let tokens: Vec<String> = tokenizer
            .tokenize("trump, clinton")
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(tokens, vec!["trump", ",", "clinton"]);
        assert_eq!(tokenizer.count("trump, clinton"), 3);
    }

    #[test]
    fn test_positions_skip_whitespace() {
        let tokenizer = UnicodeWordTokenizer::new().keep_punctuation(true);
        let tokens: Vec<Token> = tokenizer.tokenize("café  news.").unwrap().collect();

        assert_eq!(tokens, vec![Token::new("café", 0), Token::new("news", 1), Token::new(".", 2)]);
    }

    #[test]
    fn test_tokenizer_name() {
        assert_eq!(UnicodeWordTokenizer::new().name(), "unicode_word");
    }
}
