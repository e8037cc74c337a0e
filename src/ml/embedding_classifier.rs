//! Pooled embedding classifier.
//!
//! Architecture, per row of ids:
//!
//! ```text
//! ids → embedding lookup → mean over non-zero ids → dense (ReLU) → dense (sigmoid)
//! ```
//!
//! Id 0 never contributes to the pooled vector, so padding and unknown
//! tokens are ignored; a row of only zeros pools to the zero vector.

use ndarray::{Array1, Array2, Ix2};
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::classifier::{ModelMetadata, SequenceClassifier, TrainingStats};
use crate::ml::nn::{
    Head, HeadGrad, HeadMoments, Moments, Optimizer, RowGradients, check_shape, init_rng,
    uniform_matrix,
};
use crate::ml::sequence::SequenceMatrix;
use crate::ml::trainer::{self, Gradients, Network};

pub(crate) const EMBEDDING_INIT_RANGE: f32 = 0.05;

pub struct PooledGradients {
    head: HeadGrad,
    embedding: RowGradients,
}

impl Gradients for PooledGradients {
    fn merge(&mut self, other: Self) {
        self.head.merge(&other.head);
        self.embedding.merge(other.embedding);
    }

    fn scale(&mut self, factor: f32) {
        self.head.scale(factor);
        self.embedding.scale(factor);
    }
}

#[derive(Default)]
pub struct PooledMoments {
    head: HeadMoments,
    embedding: Moments<Ix2>,
}

/// Mean-pooled embeddings under a two-layer head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PooledEmbeddingClassifier {
    config: ClassifierConfig,
    /// `vocab_size × embedding_dim`.
    embedding: Array2<f32>,
    head: Head,
    trained: bool,
    metadata: Option<ModelMetadata>,
}

impl PooledEmbeddingClassifier {
    /// Create an untrained classifier for ids in `0..vocab_size`.
    pub fn new(vocab_size: usize, config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        if vocab_size == 0 {
            return Err(VerityError::invalid_config("vocab_size must be at least 1"));
        }

        let mut rng = init_rng(config.seed);
        let embedding =
            uniform_matrix(vocab_size, config.embedding_dim, EMBEDDING_INIT_RANGE, &mut rng);
        let head = Head::new(config.embedding_dim, config.hidden_units, &mut rng);

        Ok(PooledEmbeddingClassifier {
            config,
            embedding,
            head,
            trained: false,
            metadata: None,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn vocab_size(&self) -> usize {
        self.embedding.nrows()
    }

    /// Metadata of the last training run.
    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// Check that every array matches the configured shapes.
    pub fn validate(&self) -> Result<()> {
        let dim = self.config.embedding_dim;
        if self.vocab_size() == 0 {
            return Err(VerityError::model("embedding table has no rows"));
        }
        check_shape("embedding", self.embedding.shape(), &[self.vocab_size(), dim])?;
        self.head.check_shape(dim, self.config.hidden_units)
    }

    /// Mean of the embeddings of the non-zero ids, and how many there were.
    fn pool(&self, row: &[u32]) -> (Array1<f32>, usize) {
        let mut pooled = Array1::zeros(self.embedding.ncols());
        let mut count = 0usize;
        for &id in row.iter().filter(|&&id| id != 0) {
            pooled += &self.embedding.row(id as usize);
            count += 1;
        }
        if count > 0 {
            pooled /= count as f32;
        }
        (pooled, count)
    }
}

impl Network for PooledEmbeddingClassifier {
    type Gradients = PooledGradients;
    type Moments = PooledMoments;

    fn name(&self) -> &'static str {
        "pooled_embedding"
    }

    fn vocab_size(&self) -> usize {
        self.embedding.nrows()
    }

    fn zero_gradients(&self) -> PooledGradients {
        PooledGradients {
            head: self.head.zero_grad(),
            embedding: RowGradients::default(),
        }
    }

    fn probability(&self, row: &[u32]) -> f32 {
        let (pooled, _) = self.pool(row);
        self.head.forward(pooled.view()).probability
    }

    fn backpropagate(&self, row: &[u32], target: f32, grads: &mut PooledGradients) -> f32 {
        let (pooled, count) = self.pool(row);
        let act = self.head.forward(pooled.view());
        let d_pooled = self.head.backward(pooled.view(), &act, target, &mut grads.head);

        if self.config.trainable_embedding && count > 0 {
            let scale = 1.0 / count as f32;
            for &id in row.iter().filter(|&&id| id != 0) {
                grads.embedding.add(id, d_pooled.view(), scale);
            }
        }
        act.probability
    }

    fn apply(
        &mut self,
        grads: &PooledGradients,
        optimizer: &Optimizer,
        moments: &mut PooledMoments,
    ) {
        self.head.apply(&grads.head, optimizer, &mut moments.head);
        if self.config.trainable_embedding {
            optimizer.update_rows(&mut self.embedding, &grads.embedding, &mut moments.embedding);
        }
    }
}

impl SequenceClassifier for PooledEmbeddingClassifier {
    fn fit(&mut self, sequences: &SequenceMatrix, labels: &[Label]) -> Result<TrainingStats> {
        let config = self.config;
        let stats = trainer::train(self, &config, sequences, labels)?;
        self.trained = true;
        self.metadata = Some(trainer::training_metadata(
            Network::name(self),
            &config,
            self.vocab_size(),
            &stats,
        ));
        Ok(stats)
    }

    fn predict_proba(&self, sequences: &SequenceMatrix) -> Result<Vec<f32>> {
        if !self.trained {
            return Err(VerityError::model("classifier must be trained before prediction"));
        }
        trainer::check_ids(self.vocab_size(), sequences)?;
        Ok(trainer::predict(self, sequences))
    }

    fn name(&self) -> &'static str {
        Network::name(self)
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}
