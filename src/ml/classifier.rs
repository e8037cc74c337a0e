//! The sequence classifier contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Label;
use crate::error::Result;
use crate::ml::sequence::SequenceMatrix;

/// A binary classifier over encoded sequences.
///
/// `predict_proba` returns, per row, the probability that the article is
/// fake, in `[0, 1]`.
pub trait SequenceClassifier: Send + Sync {
    /// Train on `sequences` with one label per row.
    fn fit(&mut self, sequences: &SequenceMatrix, labels: &[Label]) -> Result<TrainingStats>;

    /// Probability of [`Label::Fake`] for every row.
    fn predict_proba(&self, sequences: &SequenceMatrix) -> Result<Vec<f32>>;

    /// Get the name of this classifier.
    fn name(&self) -> &'static str;

    /// Check if the classifier has been trained.
    fn is_trained(&self) -> bool;
}

/// Per-epoch training history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Mean training loss per epoch.
    pub training_losses: Vec<f64>,
    /// Training accuracy per epoch.
    pub training_accuracies: Vec<f64>,
    /// Validation loss per epoch, empty without a validation split.
    pub validation_losses: Vec<f64>,
    /// Validation accuracy per epoch, empty without a validation split.
    pub validation_accuracies: Vec<f64>,
    /// Learning rate in effect during each epoch.
    pub learning_rates: Vec<f32>,
    /// Number of epochs completed.
    pub epochs: usize,
    /// Rows used for gradient updates.
    pub training_examples: usize,
    /// Rows held out for validation.
    pub validation_examples: usize,
    /// Training time in milliseconds.
    pub training_time_ms: u64,
}

impl TrainingStats {
    pub fn final_training_loss(&self) -> Option<f64> {
        self.training_losses.last().copied()
    }

    pub fn final_validation_loss(&self) -> Option<f64> {
        self.validation_losses.last().copied()
    }

    pub fn final_validation_accuracy(&self) -> Option<f64> {
        self.validation_accuracies.last().copied()
    }

    /// Number of times the learning rate was lowered.
    pub fn learning_rate_reductions(&self) -> usize {
        self.learning_rates.windows(2).filter(|w| w[1] < w[0]).count()
    }
}

/// Model metadata for tracking model information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name/identifier.
    pub name: String,
    /// Crate version that produced the model.
    pub version: String,
    /// Training timestamp.
    pub trained_at: chrono::DateTime<chrono::Utc>,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Model hyperparameters.
    pub hyperparameters: BTreeMap<String, f64>,
    /// Performance metrics on the validation rows.
    pub validation_metrics: BTreeMap<String, f64>,
}

impl ModelMetadata {
    pub fn new<S: Into<String>>(name: S, training_examples: usize) -> Self {
        ModelMetadata {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono::Utc::now(),
            training_examples,
            hyperparameters: BTreeMap::new(),
            validation_metrics: BTreeMap::new(),
        }
    }

    pub fn with_hyperparameter<S: Into<String>>(mut self, key: S, value: f64) -> Self {
        self.hyperparameters.insert(key.into(), value);
        self
    }

    pub fn with_validation_metric<S: Into<String>>(mut self, key: S, value: f64) -> Self {
        self.validation_metrics.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_stats_helpers() {
        let stats = TrainingStats {
            training_losses: vec![0.7, 0.4],
            validation_losses: vec![0.8, 0.5],
            validation_accuracies: vec![0.5, 0.9],
            learning_rates: vec![0.1, 0.1, 0.05, 0.05, 0.025],
            ..TrainingStats::default()
        };

        assert_eq!(stats.final_training_loss(), Some(0.4));
        assert_eq!(stats.final_validation_loss(), Some(0.5));
        assert_eq!(stats.final_validation_accuracy(), Some(0.9));
        assert_eq!(stats.learning_rate_reductions(), 2);
        assert_eq!(TrainingStats::default().final_training_loss(), None);
    }

    #[test]
    fn test_metadata_builder() {
        let metadata = ModelMetadata::new("pooled", 10)
            .with_hyperparameter("epochs", 3.0)
            .with_validation_metric("accuracy", 0.75);

        assert_eq!(metadata.name, "pooled");
        assert_eq!(metadata.training_examples, 10);
        assert_eq!(metadata.hyperparameters["epochs"], 3.0);
        assert_eq!(metadata.validation_metrics["accuracy"], 0.75);
        assert!(!metadata.version.is_empty());
    }
}
