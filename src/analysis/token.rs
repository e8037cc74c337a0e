//! Tokens and token streams.
//!
//! # Examples
//!
//! ```
//! use verity::analysis::token::Token;
//!
//! let token = Token::new("Senators", 3).with_text("senators");
//!
//! assert_eq!(token.text, "senators");
//! assert_eq!(token.position, 3);
//! ```

use std::fmt;

/// A word of article text on its way through an analyzer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Index in the tokenizer output.
    pub position: usize,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }

    /// Replace the token text, keeping its position.
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        Token {
            text: text.into(),
            ..self
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lazily produced tokens; filters wrap the stream they receive.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;
