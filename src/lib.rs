//! # Verity
//!
//! A text classification pipeline for telling fake news articles from real
//! ones.
//!
//! ## Stages
//!
//! - Load two labeled CSV files into a [`Corpus`](dataset::Corpus)
//! - Clean the text with a configurable analysis chain
//! - Split into shuffled train and test sets
//! - Encode cleaned text as fixed-length integer sequences
//! - Train a bidirectional LSTM (or pooled-embedding) classifier with Adam
//! - Evaluate with accuracy, a confusion matrix and a classification report
//!
//! The [`explore`] module computes descriptive statistics of a corpus.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod explore;
pub mod ml;
pub mod pipeline;

pub mod prelude {
    pub use crate::analysis::normalizer::{LemmatizePolicy, TextNormalizer};
    pub use crate::config::{
        ClassifierConfig, EvaluationConfig, NormalizerConfig, PipelineConfig, SplitConfig,
        VectorizerConfig,
    };
    pub use crate::dataset::{Article, Corpus, DatasetLoader, Label, train_test_split};
    pub use crate::error::{Result, VerityError};
    pub use crate::explore::CorpusExplorer;
    pub use crate::ml::bundle::ModelBundle;
    pub use crate::ml::classifier::SequenceClassifier;
    pub use crate::ml::embedding_classifier::PooledEmbeddingClassifier;
    pub use crate::ml::metrics::{ClassificationReport, ConfusionMatrix, accuracy, predict_labels};
    pub use crate::ml::nn::OptimizerKind;
    pub use crate::ml::recurrent_classifier::BiLstmClassifier;
    pub use crate::ml::sequence::{SequenceEncoder, SequenceMatrix};
    pub use crate::ml::text_classifier::{Architecture, TextClassifier};
    pub use crate::ml::vocabulary::Vocabulary;
    pub use crate::pipeline::Pipeline;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
