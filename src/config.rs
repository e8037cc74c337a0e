//! Configuration for the classification pipeline.
//!
//! Every stage takes its own config struct. [`PipelineConfig`] bundles them
//! and can be loaded from a JSON file; missing fields fall back to defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::LemmatizePolicy;
use crate::error::{Result, VerityError};
use crate::ml::nn::OptimizerKind;
use crate::ml::sequence::OovPolicy;
use crate::ml::text_classifier::Architecture;

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Text cleaning settings.
    pub normalizer: NormalizerConfig,

    /// Vocabulary and sequence encoding settings.
    pub vectorizer: VectorizerConfig,

    /// Train/test split settings.
    pub split: SplitConfig,

    /// Classifier hyperparameters.
    pub classifier: ClassifierConfig,

    /// Evaluation settings.
    pub evaluation: EvaluationConfig,

    /// Worker threads for normalization and encoding.
    pub num_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            vectorizer: VectorizerConfig::default(),
            split: SplitConfig::default(),
            classifier: ClassifierConfig::default(),
            evaluation: EvaluationConfig::default(),
            num_threads: num_cpus::get(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Set the seed used by both the split and the classifier.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.seed = Some(seed);
        self.classifier.seed = Some(seed);
        self
    }

    /// Set the number of worker threads.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Check every stage's settings.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(VerityError::invalid_config("num_threads must be at least 1"));
        }
        self.vectorizer.validate()?;
        self.split.validate()?;
        self.classifier.validate()?;
        self.evaluation.validate()?;
        Ok(())
    }
}

/// Configuration for the text normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Remove HTML markup and decode character references.
    pub strip_html: bool,

    /// Remove `[...]` spans.
    pub remove_bracketed_spans: bool,

    /// Remove `scheme://...` URLs.
    pub remove_urls: bool,

    /// Drop stopwords and single punctuation characters.
    pub remove_stop_words: bool,

    /// Words added to the default stopword set.
    pub extra_stop_words: Vec<String>,

    /// How the lemmatizer is applied.
    pub lemmatize: LemmatizePolicy,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            strip_html: true,
            remove_bracketed_spans: true,
            remove_urls: true,
            remove_stop_words: true,
            extra_stop_words: Vec::new(),
            lemmatize: LemmatizePolicy::WholeString,
        }
    }
}

impl NormalizerConfig {
    /// Set the lemmatization policy.
    pub fn with_lemmatize(mut self, policy: LemmatizePolicy) -> Self {
        self.lemmatize = policy;
        self
    }

    /// Add words to the stopword set.
    pub fn with_extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_stop_words.extend(words.into_iter().map(Into::into));
        self
    }
}

/// Configuration for the vocabulary and sequence encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Vocabulary capacity including the reserved id 0.
    pub max_vocab_size: usize,

    /// Length of every encoded sequence.
    pub sequence_length: usize,

    /// Handling of tokens outside the vocabulary.
    pub oov_policy: OovPolicy,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: 100_000,
            sequence_length: 40,
            oov_policy: OovPolicy::Sentinel,
        }
    }
}

impl VectorizerConfig {
    /// Set the vocabulary capacity.
    pub fn with_max_vocab_size(mut self, max_vocab_size: usize) -> Self {
        self.max_vocab_size = max_vocab_size;
        self
    }

    /// Set the sequence length.
    pub fn with_sequence_length(mut self, sequence_length: usize) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    /// Set the out-of-vocabulary policy.
    pub fn with_oov_policy(mut self, oov_policy: OovPolicy) -> Self {
        self.oov_policy = oov_policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_vocab_size == 0 {
            return Err(VerityError::invalid_config("max_vocab_size must be at least 1"));
        }
        if self.sequence_length == 0 {
            return Err(VerityError::invalid_config("sequence_length must be at least 1"));
        }
        Ok(())
    }
}

/// Configuration for the train/test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of records held out for testing.
    pub test_fraction: f64,

    /// Shuffle before splitting.
    pub shuffle: bool,

    /// Seed for the shuffle. A random seed is drawn when unset.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            shuffle: true,
            seed: None,
        }
    }
}

impl SplitConfig {
    /// Set the test fraction.
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(VerityError::invalid_config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

/// Hyperparameters for the sequence classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Network trained by the pipeline.
    pub architecture: Architecture,

    /// Embedding width.
    pub embedding_dim: usize,

    /// LSTM units per direction.
    pub recurrent_units: usize,

    /// Width of the hidden dense layer.
    pub hidden_units: usize,

    /// Mini-batch size.
    pub batch_size: usize,

    /// Training epochs.
    pub epochs: usize,

    /// Fraction of the training rows held out for validation, taken from the end.
    pub validation_split: f64,

    /// Initial learning rate.
    pub learning_rate: f32,

    /// Update rule.
    pub optimizer: OptimizerKind,

    /// Update the embedding table during training.
    pub trainable_embedding: bool,

    /// Seed for weight initialization and batch order.
    pub seed: Option<u64>,

    /// Learning rate schedule.
    pub plateau: PlateauConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::BiLstm,
            embedding_dim: 128,
            recurrent_units: 128,
            hidden_units: 128,
            batch_size: 64,
            epochs: 10,
            validation_split: 0.1,
            learning_rate: 0.001,
            optimizer: OptimizerKind::Adam,
            trainable_embedding: false,
            seed: None,
            plateau: PlateauConfig::default(),
        }
    }
}

impl ClassifierConfig {
    /// Set the network.
    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    /// Set the number of epochs.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the embedding width.
    pub fn with_embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.embedding_dim = embedding_dim;
        self
    }

    /// Set the LSTM units per direction.
    pub fn with_recurrent_units(mut self, recurrent_units: usize) -> Self {
        self.recurrent_units = recurrent_units;
        self
    }

    /// Set the hidden layer width.
    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    /// Set the mini-batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the validation fraction. Zero disables validation.
    pub fn with_validation_split(mut self, validation_split: f64) -> Self {
        self.validation_split = validation_split;
        self
    }

    /// Set the initial learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the update rule.
    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Set the learning rate schedule.
    pub fn with_plateau(mut self, plateau: PlateauConfig) -> Self {
        self.plateau = plateau;
        self
    }

    /// Enable or disable embedding updates.
    pub fn with_trainable_embedding(mut self, trainable: bool) -> Self {
        self.trainable_embedding = trainable;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 || self.hidden_units == 0 || self.recurrent_units == 0 {
            return Err(VerityError::invalid_config(
                "embedding_dim, recurrent_units and hidden_units must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(VerityError::invalid_config("batch_size must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(VerityError::invalid_config(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !(self.learning_rate > 0.0) {
            return Err(VerityError::invalid_config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        self.plateau.validate()
    }
}

/// Reduce-on-plateau learning rate schedule, monitoring validation accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateauConfig {
    /// Epochs without improvement before the rate is reduced.
    pub patience: usize,

    /// Multiplier applied on reduction.
    pub factor: f32,

    /// Lower bound on the learning rate.
    pub min_learning_rate: f32,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        Self {
            patience: 2,
            factor: 0.5,
            min_learning_rate: 1e-5,
        }
    }
}

impl PlateauConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.factor > 0.0 && self.factor < 1.0) {
            return Err(VerityError::invalid_config(format!(
                "plateau factor must be in (0, 1), got {}",
                self.factor
            )));
        }
        if self.min_learning_rate < 0.0 {
            return Err(VerityError::invalid_config("min_learning_rate must not be negative"));
        }
        Ok(())
    }
}

/// Configuration for the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// A record is predicted fake when its probability is strictly greater.
    pub threshold: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(VerityError::invalid_config(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.num_threads > 0);
        assert_eq!(config.vectorizer.max_vocab_size, 100_000);
        assert_eq!(config.vectorizer.sequence_length, 40);
        assert_eq!(config.vectorizer.oov_policy, OovPolicy::Sentinel);
        assert_eq!(config.split.test_fraction, 0.2);
        assert_eq!(config.classifier.architecture, Architecture::BiLstm);
        assert_eq!(config.classifier.embedding_dim, 128);
        assert_eq!(config.classifier.recurrent_units, 128);
        assert_eq!(config.classifier.optimizer, OptimizerKind::Adam);
        assert_eq!(config.classifier.learning_rate, 0.001);
        assert_eq!(config.classifier.batch_size, 64);
        assert_eq!(config.classifier.epochs, 10);
        assert_eq!(config.classifier.validation_split, 0.1);
        assert_eq!(config.classifier.plateau.patience, 2);
        assert_eq!(config.evaluation.threshold, 0.5);
        assert_eq!(config.normalizer.lemmatize, LemmatizePolicy::WholeString);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::default().with_seed(7).with_num_threads(2);
        assert_eq!(config.split.seed, Some(7));
        assert_eq!(config.classifier.seed, Some(7));
        assert_eq!(config.num_threads, 2);

        let vectorizer = VectorizerConfig::default()
            .with_max_vocab_size(10)
            .with_sequence_length(5)
            .with_oov_policy(OovPolicy::Skip);
        assert_eq!(vectorizer.max_vocab_size, 10);
        assert_eq!(vectorizer.sequence_length, 5);
        assert_eq!(vectorizer.oov_policy, OovPolicy::Skip);
    }

    #[test]
    fn test_invalid_values() {
        assert!(VectorizerConfig::default().with_max_vocab_size(0).validate().is_err());
        assert!(VectorizerConfig::default().with_sequence_length(0).validate().is_err());
        assert!(SplitConfig::default().with_test_fraction(0.0).validate().is_err());
        assert!(SplitConfig::default().with_test_fraction(1.0).validate().is_err());
        assert!(ClassifierConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(ClassifierConfig::default().with_batch_size(0).validate().is_err());
        assert!(ClassifierConfig::default().with_recurrent_units(0).validate().is_err());
        assert!(ClassifierConfig::default().with_validation_split(1.0).validate().is_err());
        assert!(PipelineConfig::default().with_num_threads(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "vectorizer": { "sequence_length": 12 }, "normalizer": { "lemmatize": "per_token" } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        let classifier: ClassifierConfig =
            serde_json::from_str(r#"{ "architecture": "pooled_embedding", "optimizer": "sgd" }"#).unwrap();
        assert_eq!(classifier.architecture, Architecture::PooledEmbedding);
        assert_eq!(classifier.optimizer, OptimizerKind::Sgd);
        assert_eq!(classifier.recurrent_units, 128);

        assert_eq!(config.vectorizer.sequence_length, 12);
        assert_eq!(config.vectorizer.max_vocab_size, 100_000);
        assert_eq!(config.normalizer.lemmatize, LemmatizePolicy::PerToken);
        assert!(config.normalizer.strip_html);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        let config = PipelineConfig::default().with_seed(42);

        config.save(&path).unwrap();
        let loaded = PipelineConfig::from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "vectorizer": { "max_vocab_size": 0 } }"#).unwrap();

        let err = PipelineConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, VerityError::InvalidConfig(_)));
    }
}
