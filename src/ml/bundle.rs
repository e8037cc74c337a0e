//! Saved models.
//!
//! A [`ModelBundle`] holds everything `predict` needs to score new text: the
//! normalizer settings, the fitted encoder (vocabulary included), the trained
//! classifier and the decision threshold. It is stored as JSON.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::TextNormalizer;
use crate::config::NormalizerConfig;
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::classifier::SequenceClassifier;
use crate::ml::sequence::SequenceEncoder;
use crate::ml::text_classifier::TextClassifier;

/// Bundle layout version written by this crate.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// One scored text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    pub probability_fake: f32,
    pub cleaned: String,
}

/// Normalizer, encoder and classifier saved together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub normalizer: NormalizerConfig,
    pub encoder: SequenceEncoder,
    pub classifier: TextClassifier,
    pub threshold: f32,
}

impl ModelBundle {
    pub fn new(
        normalizer: NormalizerConfig,
        encoder: SequenceEncoder,
        classifier: TextClassifier,
        threshold: f32,
    ) -> Self {
        ModelBundle {
            format_version: BUNDLE_FORMAT_VERSION,
            normalizer,
            encoder,
            classifier,
            threshold,
        }
    }

    /// Write the bundle as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string(self)?;
        fs::write(path, content)?;
        info!("saved model bundle to {}", path.display());
        Ok(())
    }

    /// Read a bundle written by [`save`](Self::save).
    ///
    /// Fails with [`VerityError::Model`] when the stored arrays do not match
    /// the stored configuration or the encoder's id space.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let bundle: ModelBundle = serde_json::from_str(&content)?;
        if bundle.format_version != BUNDLE_FORMAT_VERSION {
            return Err(VerityError::model(format!(
                "unsupported bundle format version {}",
                bundle.format_version
            )));
        }
        if !bundle.classifier.is_trained() {
            return Err(VerityError::model("bundle holds an untrained classifier"));
        }
        bundle.classifier.validate()?;
        let id_space = bundle.encoder.vocabulary().id_space();
        if id_space > bundle.classifier.vocab_size() {
            return Err(VerityError::model(format!(
                "encoder emits ids up to {} but the embedding table has {} rows",
                id_space - 1,
                bundle.classifier.vocab_size()
            )));
        }
        Ok(bundle)
    }

    /// Clean, encode and classify raw texts.
    pub fn predict<S>(&self, texts: &[S]) -> Result<Vec<Prediction>>
    where
        S: AsRef<str> + Sync,
    {
        let normalizer = TextNormalizer::new(&self.normalizer)?;
        let cleaned = normalizer.normalize_all(texts)?;
        let sequences = self.encoder.encode_batch(&cleaned);
        let probabilities = self.classifier.predict_proba(&sequences)?;

        Ok(cleaned
            .into_iter()
            .zip(probabilities)
            .map(|(cleaned, p)| Prediction {
                label: Label::from_is_fake(p > self.threshold),
                probability_fake: p,
                cleaned,
            })
            .collect())
    }
}
