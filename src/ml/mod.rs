//! Vectorization, classification and evaluation.
//!
//! - [`vocabulary`]: frequency-ranked token ids fit on training text
//! - [`sequence`]: fixed-length id sequences
//! - [`classifier`]: the classifier contract and training history
//! - [`nn`]: dense layers, the classification head and optimizers on `ndarray`
//! - [`trainer`]: mini-batch training loop and learning rate schedule
//! - [`embedding_classifier`]: mean-pooled embedding model
//! - [`recurrent_classifier`]: bidirectional LSTM model
//! - [`text_classifier`]: the built-in models behind one type
//! - [`metrics`]: thresholding, accuracy, confusion matrix, report
//! - [`bundle`]: saving a trained model with its vocabulary

pub mod bundle;
pub mod classifier;
pub mod embedding_classifier;
pub mod metrics;
pub mod nn;
pub mod recurrent_classifier;
pub mod sequence;
pub mod text_classifier;
pub mod trainer;
pub mod vocabulary;

pub use bundle::{ModelBundle, Prediction};
pub use classifier::{ModelMetadata, SequenceClassifier, TrainingStats};
pub use embedding_classifier::PooledEmbeddingClassifier;
pub use metrics::{
    AverageMetrics, ClassMetrics, ClassificationReport, ConfusionMatrix, accuracy, predict_labels,
};
pub use nn::OptimizerKind;
pub use recurrent_classifier::{BiLstmClassifier, LstmCell};
pub use sequence::{OovPolicy, SequenceEncoder, SequenceMatrix};
pub use text_classifier::{Architecture, TextClassifier};
pub use trainer::ReduceLrOnPlateau;
pub use vocabulary::{RESERVED_ID, Vocabulary};
