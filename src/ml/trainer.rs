//! Mini-batch training shared by the built-in classifiers.
//!
//! A [`Network`] exposes a per-row forward pass and backward pass; [`train`]
//! runs the epochs around it. Within a batch, fixed-size chunks of rows are
//! back-propagated in parallel and their gradients merged in chunk order, so
//! a seeded run gives the same weights on any number of threads.

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::{ClassifierConfig, PlateauConfig};
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::classifier::{ModelMetadata, TrainingStats};
use crate::ml::nn::{Optimizer, binary_cross_entropy};
use crate::ml::sequence::SequenceMatrix;

/// Rows back-propagated by one task before their gradients are merged.
const GRADIENT_CHUNK_ROWS: usize = 8;

/// Lowers the learning rate when a monitored metric stops improving.
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    config: PlateauConfig,
    best: Option<f64>,
    wait: usize,
}

impl ReduceLrOnPlateau {
    /// Smallest increase that counts as an improvement.
    pub const MIN_DELTA: f64 = 1e-4;

    pub fn new(config: PlateauConfig) -> Self {
        ReduceLrOnPlateau {
            config,
            best: None,
            wait: 0,
        }
    }

    /// Record the metric of a finished epoch and return the learning rate
    /// for the next one.
    pub fn step(&mut self, metric: f64, learning_rate: f32) -> f32 {
        match self.best {
            Some(best) if metric <= best + Self::MIN_DELTA => self.wait += 1,
            _ => {
                self.best = Some(metric);
                self.wait = 0;
                return learning_rate;
            }
        }

        if self.wait >= self.config.patience && learning_rate > self.config.min_learning_rate {
            self.wait = 0;
            return (learning_rate * self.config.factor).max(self.config.min_learning_rate);
        }
        learning_rate
    }
}

/// Accumulated gradients of some rows.
pub trait Gradients: Send {
    /// Add `other` into `self`.
    fn merge(&mut self, other: Self);

    /// Multiply every entry by `factor`.
    fn scale(&mut self, factor: f32);
}

/// A differentiable model over rows of token ids.
pub trait Network: Sync {
    type Gradients: Gradients;
    type Moments: Default;

    fn name(&self) -> &'static str;

    /// Rows of the embedding table; valid ids are `0..vocab_size`.
    fn vocab_size(&self) -> usize;

    fn zero_gradients(&self) -> Self::Gradients;

    /// Probability of [`Label::Fake`] for one row.
    fn probability(&self, row: &[u32]) -> f32;

    /// Add the loss gradient of one row to `grads` and return the row's
    /// predicted probability.
    fn backpropagate(&self, row: &[u32], target: f32, grads: &mut Self::Gradients) -> f32;

    fn apply(
        &mut self,
        grads: &Self::Gradients,
        optimizer: &Optimizer,
        moments: &mut Self::Moments,
    );
}

/// Fails if any id falls outside the embedding table.
pub fn check_ids(vocab_size: usize, sequences: &SequenceMatrix) -> Result<()> {
    match sequences.max_id() {
        Some(id) if id as usize >= vocab_size => Err(VerityError::model(format!(
            "id {id} is outside the embedding table of size {vocab_size}"
        ))),
        _ => Ok(()),
    }
}

/// Probability of [`Label::Fake`] for every row.
pub fn predict<N: Network>(network: &N, sequences: &SequenceMatrix) -> Vec<f32> {
    (0..sequences.rows())
        .into_par_iter()
        .map(|i| network.probability(sequences.row(i)))
        .collect()
}

/// Mean loss and accuracy over a block of rows.
pub fn evaluate<N: Network>(
    network: &N,
    sequences: &SequenceMatrix,
    labels: &[Label],
) -> (f64, f64) {
    // Summed in row order so repeated runs give identical losses.
    let per_row: Vec<(f64, bool)> = (0..sequences.rows())
        .into_par_iter()
        .map(|i| {
            let p = network.probability(sequences.row(i));
            let label = labels[i];
            (binary_cross_entropy(p, label.target()) as f64, (p > 0.5) == label.is_fake())
        })
        .collect();
    let loss: f64 = per_row.iter().map(|(loss, _)| loss).sum();
    let correct = per_row.iter().filter(|(_, hit)| *hit).count();

    let n = sequences.rows().max(1) as f64;
    (loss / n, correct as f64 / n)
}

/// Train `network` on `sequences`, holding out the last
/// `validation_split` of the rows for validation.
pub fn train<N: Network>(
    network: &mut N,
    config: &ClassifierConfig,
    sequences: &SequenceMatrix,
    labels: &[Label],
) -> Result<TrainingStats> {
    let rows = sequences.rows();
    if rows == 0 {
        return Err(VerityError::model("cannot train on an empty dataset"));
    }
    if labels.len() != rows {
        return Err(VerityError::model(format!(
            "{} labels for {rows} sequences",
            labels.len()
        )));
    }
    check_ids(network.vocab_size(), sequences)?;

    let train_rows = ((rows as f64) * (1.0 - config.validation_split)) as usize;
    if train_rows == 0 {
        return Err(VerityError::model(format!(
            "validation split {} leaves no training rows out of {rows}",
            config.validation_split
        )));
    }
    let validation = (train_rows < rows).then(|| {
        (
            sequences.slice_rows(train_rows..rows),
            &labels[train_rows..rows],
        )
    });

    info!(
        "training {} on {train_rows} rows, validating on {} rows",
        network.name(),
        rows - train_rows
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let mut scheduler = ReduceLrOnPlateau::new(config.plateau);
    let mut optimizer = Optimizer::new(config.optimizer, config.learning_rate);
    let mut moments: N::Moments = Default::default();
    let mut order: Vec<usize> = (0..train_rows).collect();
    let mut stats = TrainingStats {
        training_examples: train_rows,
        validation_examples: rows - train_rows,
        ..TrainingStats::default()
    };
    let start = Instant::now();

    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);
        let learning_rate = optimizer.learning_rate();
        let mut epoch_loss = 0.0f64;
        let mut correct = 0usize;

        for batch in order.chunks(config.batch_size) {
            let shared: &N = network;
            let chunks: Vec<(N::Gradients, f64, usize)> = batch
                .par_chunks(GRADIENT_CHUNK_ROWS)
                .map(|chunk| {
                    let mut grads = shared.zero_gradients();
                    let mut loss = 0.0f64;
                    let mut hits = 0usize;
                    for &i in chunk {
                        let label = labels[i];
                        let p = shared.backpropagate(sequences.row(i), label.target(), &mut grads);
                        loss += binary_cross_entropy(p, label.target()) as f64;
                        if (p > 0.5) == label.is_fake() {
                            hits += 1;
                        }
                    }
                    (grads, loss, hits)
                })
                .collect();

            let mut total: Option<N::Gradients> = None;
            for (grads, loss, hits) in chunks {
                epoch_loss += loss;
                correct += hits;
                match total.as_mut() {
                    Some(sum) => sum.merge(grads),
                    None => total = Some(grads),
                }
            }
            if let Some(mut grads) = total {
                grads.scale(1.0 / batch.len() as f32);
                optimizer.next_step();
                network.apply(&grads, &optimizer, &mut moments);
            }
        }

        let train_loss = epoch_loss / train_rows as f64;
        let train_accuracy = correct as f64 / train_rows as f64;
        stats.training_losses.push(train_loss);
        stats.training_accuracies.push(train_accuracy);
        stats.learning_rates.push(learning_rate);

        let monitored = match &validation {
            Some((val_sequences, val_labels)) => {
                let (val_loss, val_accuracy) = evaluate(&*network, val_sequences, val_labels);
                stats.validation_losses.push(val_loss);
                stats.validation_accuracies.push(val_accuracy);
                debug!(
                    "epoch {}/{}: loss {train_loss:.4}, accuracy {train_accuracy:.4}, \
                     val_loss {val_loss:.4}, val_accuracy {val_accuracy:.4}, lr {learning_rate}",
                    epoch + 1,
                    config.epochs
                );
                val_accuracy
            }
            None => {
                debug!(
                    "epoch {}/{}: loss {train_loss:.4}, accuracy {train_accuracy:.4}, lr {learning_rate}",
                    epoch + 1,
                    config.epochs
                );
                train_accuracy
            }
        };

        let next = scheduler.step(monitored, learning_rate);
        if next < learning_rate {
            info!("reducing learning rate to {next} after epoch {}", epoch + 1);
        }
        optimizer.set_learning_rate(next);
        stats.epochs = epoch + 1;
    }

    stats.training_time_ms = start.elapsed().as_millis() as u64;
    info!(
        "trained {} for {} epochs in {} ms",
        network.name(),
        stats.epochs,
        stats.training_time_ms
    );
    Ok(stats)
}

/// Metadata common to every built-in classifier.
pub fn training_metadata(
    name: &str,
    config: &ClassifierConfig,
    vocab_size: usize,
    stats: &TrainingStats,
) -> ModelMetadata {
    let mut metadata = ModelMetadata::new(name, stats.training_examples)
        .with_hyperparameter("embedding_dim", config.embedding_dim as f64)
        .with_hyperparameter("hidden_units", config.hidden_units as f64)
        .with_hyperparameter("batch_size", config.batch_size as f64)
        .with_hyperparameter("epochs", config.epochs as f64)
        .with_hyperparameter("learning_rate", config.learning_rate as f64)
        .with_hyperparameter("validation_split", config.validation_split)
        .with_hyperparameter("vocab_size", vocab_size as f64);
    if let Some(accuracy) = stats.final_validation_accuracy() {
        metadata = metadata.with_validation_metric("accuracy", accuracy);
    }
    if let Some(loss) = stats.final_validation_loss() {
        metadata = metadata.with_validation_metric("loss", loss);
    }
    metadata
}
