//! Frequency-ranked token vocabulary.
//!
//! Tokens are whitespace-delimited words of cleaned text. Ranking is by
//! descending corpus count, ties broken by first occurrence. With capacity
//! `max_size`, the top `max_size - 1` tokens receive ids `1..max_size`; id 0
//! is reserved for padding and unknown tokens.

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};

/// Id used for padding and for tokens outside the vocabulary.
pub const RESERVED_ID: u32 = 0;

#[derive(Serialize, Deserialize)]
struct VocabularyData {
    max_size: usize,
    tokens: Vec<String>,
}

/// A fitted token → id mapping. Only exists after [`Vocabulary::fit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "VocabularyData", try_from = "VocabularyData")]
pub struct Vocabulary {
    max_size: usize,
    /// Token with id `i + 1` at position `i`.
    tokens: Vec<String>,
    index: AHashMap<String, u32>,
}

impl Vocabulary {
    /// Fit a vocabulary of capacity `max_size` on training texts.
    pub fn fit<S: AsRef<str>>(texts: &[S], max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(VerityError::invalid_config("max_vocab_size must be at least 1"));
        }

        // token -> (count, first seen)
        let mut counts: AHashMap<&str, (usize, usize)> = AHashMap::new();
        for text in texts {
            for token in text.as_ref().split_whitespace() {
                let next = counts.len();
                counts.entry(token).or_insert((0, next)).0 += 1;
            }
        }

        let mut ranked: Vec<(&str, usize, usize)> = counts
            .into_iter()
            .map(|(token, (count, first))| (token, count, first))
            .collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let distinct = ranked.len();
        let tokens: Vec<String> = ranked
            .into_iter()
            .take(max_size - 1)
            .map(|(token, _, _)| token.to_string())
            .collect();

        debug!(
            "fitted vocabulary: {} of {} distinct tokens kept (capacity {max_size})",
            tokens.len(),
            distinct
        );

        Ok(Self::from_tokens(max_size, tokens))
    }

    fn from_tokens(max_size: usize, tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i as u32 + 1))
            .collect();
        Vocabulary {
            max_size,
            tokens,
            index,
        }
    }

    /// Id of `token`, if it is in the vocabulary.
    pub fn id(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    /// Token carrying `id`. The reserved id has no token.
    pub fn token(&self, id: u32) -> Option<&str> {
        if id == RESERVED_ID {
            return None;
        }
        self.tokens.get(id as usize - 1).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Number of tokens with an id, excluding the reserved id.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Configured capacity, counting the reserved id.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of distinct ids in use, counting the reserved id.
    pub fn id_space(&self) -> usize {
        self.tokens.len() + 1
    }

    /// Tokens in id order, starting at id 1.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl From<Vocabulary> for VocabularyData {
    fn from(vocabulary: Vocabulary) -> Self {
        VocabularyData {
            max_size: vocabulary.max_size,
            tokens: vocabulary.tokens,
        }
    }
}

impl TryFrom<VocabularyData> for Vocabulary {
    type Error = VerityError;

    fn try_from(data: VocabularyData) -> Result<Self> {
        if data.max_size == 0 || data.tokens.len() >= data.max_size {
            return Err(VerityError::model(format!(
                "vocabulary with {} tokens does not fit capacity {}",
                data.tokens.len(),
                data.max_size
            )));
        }
        Ok(Self::from_tokens(data.max_size, data.tokens))
    }
}
