//! The built-in classifiers behind one type.

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::dataset::Label;
use crate::error::Result;
use crate::ml::classifier::{ModelMetadata, SequenceClassifier, TrainingStats};
use crate::ml::embedding_classifier::PooledEmbeddingClassifier;
use crate::ml::recurrent_classifier::BiLstmClassifier;
use crate::ml::sequence::SequenceMatrix;

/// Which built-in network to train.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// Mean of the token embeddings under a dense head.
    PooledEmbedding,
    /// Bidirectional LSTM under a dense head.
    #[default]
    BiLstm,
}

/// A trained or untrained built-in classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextClassifier {
    PooledEmbedding(PooledEmbeddingClassifier),
    BiLstm(BiLstmClassifier),
}

impl TextClassifier {
    /// Create the network selected by `config.architecture`.
    pub fn new(vocab_size: usize, config: ClassifierConfig) -> Result<Self> {
        Ok(match config.architecture {
            Architecture::PooledEmbedding => {
                TextClassifier::PooledEmbedding(PooledEmbeddingClassifier::new(vocab_size, config)?)
            }
            Architecture::BiLstm => TextClassifier::BiLstm(BiLstmClassifier::new(vocab_size, config)?),
        })
    }

    pub fn architecture(&self) -> Architecture {
        match self {
            TextClassifier::PooledEmbedding(_) => Architecture::PooledEmbedding,
            TextClassifier::BiLstm(_) => Architecture::BiLstm,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        match self {
            TextClassifier::PooledEmbedding(c) => c.config(),
            TextClassifier::BiLstm(c) => c.config(),
        }
    }

    pub fn vocab_size(&self) -> usize {
        match self {
            TextClassifier::PooledEmbedding(c) => c.vocab_size(),
            TextClassifier::BiLstm(c) => c.vocab_size(),
        }
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        match self {
            TextClassifier::PooledEmbedding(c) => c.metadata(),
            TextClassifier::BiLstm(c) => c.metadata(),
        }
    }

    /// Check that the stored arrays match the stored configuration.
    pub fn validate(&self) -> Result<()> {
        match self {
            TextClassifier::PooledEmbedding(c) => c.validate(),
            TextClassifier::BiLstm(c) => c.validate(),
        }
    }
}

impl SequenceClassifier for TextClassifier {
    fn fit(&mut self, sequences: &SequenceMatrix, labels: &[Label]) -> Result<TrainingStats> {
        match self {
            TextClassifier::PooledEmbedding(c) => c.fit(sequences, labels),
            TextClassifier::BiLstm(c) => c.fit(sequences, labels),
        }
    }

    fn predict_proba(&self, sequences: &SequenceMatrix) -> Result<Vec<f32>> {
        match self {
            TextClassifier::PooledEmbedding(c) => c.predict_proba(sequences),
            TextClassifier::BiLstm(c) => c.predict_proba(sequences),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TextClassifier::PooledEmbedding(c) => SequenceClassifier::name(c),
            TextClassifier::BiLstm(c) => SequenceClassifier::name(c),
        }
    }

    fn is_trained(&self) -> bool {
        match self {
            TextClassifier::PooledEmbedding(c) => c.is_trained(),
            TextClassifier::BiLstm(c) => c.is_trained(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(architecture: Architecture) -> ClassifierConfig {
        ClassifierConfig::default()
            .with_architecture(architecture)
            .with_embedding_dim(4)
            .with_recurrent_units(3)
            .with_hidden_units(4)
            .with_epochs(2)
            .with_validation_split(0.0)
            .with_seed(9)
    }

    #[test]
    fn test_default_architecture_is_bi_lstm() {
        assert_eq!(ClassifierConfig::default().architecture, Architecture::BiLstm);
        let model = TextClassifier::new(5, ClassifierConfig::default().with_seed(1)).unwrap();
        assert_eq!(model.architecture(), Architecture::BiLstm);
        assert_eq!(model.name(), "bi_lstm");
    }

    #[test]
    fn test_both_architectures_train() {
        let sequences =
            SequenceMatrix::from_rows(vec![vec![1, 2, 0], vec![3, 4, 0], vec![1, 0, 0]], 3).unwrap();
        let labels = [Label::Fake, Label::Real, Label::Fake];

        for architecture in [Architecture::PooledEmbedding, Architecture::BiLstm] {
            let mut model = TextClassifier::new(5, config(architecture)).unwrap();
            assert!(!model.is_trained());
            assert_eq!(model.vocab_size(), 5);

            let stats = model.fit(&sequences, &labels).unwrap();

            assert_eq!(stats.epochs, 2);
            assert!(model.is_trained());
            assert!(model.validate().is_ok());
            assert_eq!(model.metadata().unwrap().name, model.name());
            assert_eq!(model.predict_proba(&sequences).unwrap().len(), 3);
        }
    }

    #[test]
    fn test_serde_tags_the_architecture() {
        let model = TextClassifier::new(5, config(Architecture::PooledEmbedding)).unwrap();

        let value = serde_json::to_value(&model).unwrap();
        assert!(value.get("pooled_embedding").is_some());

        let restored: TextClassifier = serde_json::from_value(value).unwrap();
        assert_eq!(restored, model);
        assert_eq!(restored.config().embedding_dim, 4);
    }
}
