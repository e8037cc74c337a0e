//! End-to-end training and evaluation.
//!
//! ```text
//! Corpus → TextNormalizer → train/test split → SequenceEncoder (fit on train)
//!        → SequenceClassifier → threshold → accuracy / confusion matrix / report
//! ```
//!
//! The vocabulary is fit once, on the training split only.

use log::info;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::TextNormalizer;
use crate::config::PipelineConfig;
use crate::dataset::{Corpus, Label, train_test_split};
use crate::error::{Result, VerityError};
use crate::ml::bundle::ModelBundle;
use crate::ml::classifier::{SequenceClassifier, TrainingStats};
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix, accuracy, predict_labels};
use crate::ml::sequence::SequenceEncoder;
use crate::ml::text_classifier::TextClassifier;

/// Results of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub classifier: String,
    pub total_records: usize,
    pub train_records: usize,
    pub test_records: usize,
    /// Tokens with an id, excluding the reserved id 0.
    pub vocabulary_size: usize,
    pub sequence_length: usize,
    pub training: TrainingStats,
    pub accuracy: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub classification_report: ClassificationReport,
}

/// A finished run: the report plus everything needed to score new text.
#[derive(Debug, Clone)]
pub struct TrainedPipeline<C> {
    pub report: PipelineReport,
    pub encoder: SequenceEncoder,
    pub classifier: C,
}

/// Runs the pipeline stages with one configuration.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: TextNormalizer,
    pool: ThreadPool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = TextNormalizer::new(&config.normalizer)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build thread pool: {e}"))?;

        Ok(Pipeline {
            config,
            normalizer,
            pool,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Cleaned `title + " " + body` of every article, in corpus order.
    pub fn clean(&self, corpus: &Corpus) -> Result<Vec<String>> {
        let texts = corpus.full_texts();
        let cleaned = self.pool.install(|| self.normalizer.normalize_all(&texts))?;
        info!("cleaned {} articles", cleaned.len());
        Ok(cleaned)
    }

    /// Train and evaluate the built-in classifier selected by
    /// `classifier.architecture`.
    pub fn run(&self, corpus: &Corpus) -> Result<TrainedPipeline<TextClassifier>> {
        let classifier_config = self.config.classifier;
        self.run_with(corpus, |encoder| {
            TextClassifier::new(encoder.vocabulary().id_space(), classifier_config)
        })
    }

    /// Train and evaluate a classifier built by `make_classifier` from the
    /// fitted encoder.
    pub fn run_with<C, F>(&self, corpus: &Corpus, make_classifier: F) -> Result<TrainedPipeline<C>>
    where
        C: SequenceClassifier,
        F: FnOnce(&SequenceEncoder) -> Result<C>,
    {
        if corpus.is_empty() {
            return Err(VerityError::dataset("corpus is empty"));
        }

        let cleaned = self.clean(corpus)?;
        let records: Vec<(String, Label)> = cleaned.into_iter().zip(corpus.labels()).collect();
        let split = train_test_split(records, &self.config.split)?;
        let (train_texts, train_labels): (Vec<String>, Vec<Label>) = split.train.into_iter().unzip();
        let (test_texts, test_labels): (Vec<String>, Vec<Label>) = split.test.into_iter().unzip();
        info!(
            "split {} records into {} train and {} test",
            corpus.len(),
            train_texts.len(),
            test_texts.len()
        );

        let encoder = SequenceEncoder::fit(&train_texts, &self.config.vectorizer)?;
        info!(
            "vocabulary holds {} tokens (capacity {})",
            encoder.vocabulary().len(),
            encoder.vocabulary().max_size()
        );

        let (x_train, x_test) = self.pool.install(|| {
            (
                encoder.encode_batch(&train_texts),
                encoder.encode_batch(&test_texts),
            )
        });

        let mut classifier = make_classifier(&encoder)?;
        let training = self.pool.install(|| classifier.fit(&x_train, &train_labels))?;
        let probabilities = self.pool.install(|| classifier.predict_proba(&x_test))?;

        let predicted: Vec<Label> = predict_labels(&probabilities, self.config.evaluation.threshold)
            .into_iter()
            .map(Label::from_is_fake)
            .collect();
        let accuracy = accuracy(&predicted, &test_labels)?;
        let confusion_matrix = ConfusionMatrix::from_labels(&predicted, &test_labels)?;
        let classification_report = ClassificationReport::from_confusion_matrix(confusion_matrix);
        info!("test accuracy {:.4} on {} records", accuracy, test_labels.len());

        let report = PipelineReport {
            classifier: classifier.name().to_string(),
            total_records: corpus.len(),
            train_records: train_labels.len(),
            test_records: test_labels.len(),
            vocabulary_size: encoder.vocabulary().len(),
            sequence_length: encoder.sequence_length(),
            training,
            accuracy,
            confusion_matrix,
            classification_report,
        };

        Ok(TrainedPipeline {
            report,
            encoder,
            classifier,
        })
    }
}

impl TrainedPipeline<TextClassifier> {
    /// Package the trained model for later prediction.
    pub fn into_bundle(self, config: &PipelineConfig) -> ModelBundle {
        ModelBundle::new(
            config.normalizer.clone(),
            self.encoder,
            self.classifier,
            config.evaluation.threshold,
        )
    }
}
