//! Fixed-length integer sequence encoding.
//!
//! Every text becomes exactly `sequence_length` ids: tokens are looked up in
//! the vocabulary, then the result is padded with id 0 on the right or cut
//! from the end.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::VectorizerConfig;
use crate::error::{Result, VerityError};
use crate::ml::vocabulary::{RESERVED_ID, Vocabulary};

/// What happens to a token that is not in the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OovPolicy {
    /// The token becomes id 0.
    #[default]
    Sentinel,

    /// The token is dropped before padding.
    Skip,
}

/// Row-major matrix of encoded sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMatrix {
    sequence_length: usize,
    data: Vec<u32>,
}

impl SequenceMatrix {
    /// An empty matrix with the given row width.
    pub fn empty(sequence_length: usize) -> Self {
        SequenceMatrix {
            sequence_length,
            data: Vec::new(),
        }
    }

    /// Build from rows that must all have `sequence_length` entries.
    pub fn from_rows(rows: Vec<Vec<u32>>, sequence_length: usize) -> Result<Self> {
        if sequence_length == 0 {
            return Err(VerityError::invalid_config("sequence_length must be at least 1"));
        }
        let mut data = Vec::with_capacity(rows.len() * sequence_length);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != sequence_length {
                return Err(VerityError::model(format!(
                    "row {i} has {} ids, expected {sequence_length}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Ok(SequenceMatrix {
            sequence_length,
            data,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        if self.sequence_length == 0 {
            0
        } else {
            self.data.len() / self.sequence_length
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// The ids of row `i`.
    pub fn row(&self, i: usize) -> &[u32] {
        let start = i * self.sequence_length;
        &self.data[start..start + self.sequence_length]
    }

    pub fn iter_rows(&self) -> std::slice::ChunksExact<'_, u32> {
        self.data.chunks_exact(self.sequence_length.max(1))
    }

    /// Copy of a contiguous block of rows.
    pub fn slice_rows(&self, range: Range<usize>) -> SequenceMatrix {
        let start = range.start * self.sequence_length;
        let end = range.end * self.sequence_length;
        SequenceMatrix {
            sequence_length: self.sequence_length,
            data: self.data[start..end].to_vec(),
        }
    }

    /// Largest id present, if any row is non-empty.
    pub fn max_id(&self) -> Option<u32> {
        self.data.iter().copied().max()
    }
}

/// Encodes cleaned text with a fitted vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEncoder {
    vocabulary: Vocabulary,
    sequence_length: usize,
    oov_policy: OovPolicy,
}

impl SequenceEncoder {
    pub fn new(vocabulary: Vocabulary, sequence_length: usize, oov_policy: OovPolicy) -> Result<Self> {
        if sequence_length == 0 {
            return Err(VerityError::invalid_config("sequence_length must be at least 1"));
        }
        Ok(SequenceEncoder {
            vocabulary,
            sequence_length,
            oov_policy,
        })
    }

    /// Fit a vocabulary on training texts and wrap it in an encoder.
    pub fn fit<S: AsRef<str>>(texts: &[S], config: &VectorizerConfig) -> Result<Self> {
        config.validate()?;
        let vocabulary = Vocabulary::fit(texts, config.max_vocab_size)?;
        Self::new(vocabulary, config.sequence_length, config.oov_policy)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn oov_policy(&self) -> OovPolicy {
        self.oov_policy
    }

    /// Encode one text to exactly `sequence_length` ids.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.encode_with_length(text, self.sequence_length)
    }

    /// Encode one text to exactly `length` ids.
    pub fn encode_with_length(&self, text: &str, length: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = text
            .split_whitespace()
            .filter_map(|token| match (self.vocabulary.id(token), self.oov_policy) {
                (Some(id), _) => Some(id),
                (None, OovPolicy::Sentinel) => Some(RESERVED_ID),
                (None, OovPolicy::Skip) => None,
            })
            .take(length)
            .collect();
        ids.resize(length, RESERVED_ID);
        ids
    }

    /// Encode many texts in parallel. Row `i` encodes `texts[i]`.
    pub fn encode_batch<S>(&self, texts: &[S]) -> SequenceMatrix
    where
        S: AsRef<str> + Sync,
    {
        let rows: Vec<Vec<u32>> = texts
            .par_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect();

        SequenceMatrix {
            sequence_length: self.sequence_length,
            data: rows.into_iter().flatten().collect(),
        }
    }
}
