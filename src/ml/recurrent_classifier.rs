//! Bidirectional LSTM classifier.
//!
//! ```text
//! ids → embedding ─┬─ forward LSTM  → last state ─┐
//!                  └─ backward LSTM → last state ─┴→ concat → dense (ReLU) → dense (sigmoid)
//! ```
//!
//! Only the non-zero ids of a row are fed to the recurrent cells, so padding
//! and unknown tokens are masked out. The backward cell reads the same ids in
//! reverse order. A row without non-zero ids encodes to the zero state.

use ndarray::{Array1, Array2, ArrayView1, Ix1, Ix2, s};
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::classifier::{ModelMetadata, SequenceClassifier, TrainingStats};
use crate::ml::embedding_classifier::EMBEDDING_INIT_RANGE;
use crate::ml::nn::{
    Head, HeadGrad, HeadMoments, InitRng, Moments, Optimizer, RowGradients, accumulate_outer,
    check_shape, init_rng, sigmoid, uniform_matrix,
};
use crate::ml::sequence::SequenceMatrix;
use crate::ml::trainer::{self, Gradients, Network};

/// One LSTM direction. Gate rows are stacked in the order
/// input, forget, candidate, output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmCell {
    /// `4·units × inputs`.
    input_weights: Array2<f32>,
    /// `4·units × units`.
    recurrent_weights: Array2<f32>,
    bias: Array1<f32>,
}

/// Values of one time step kept for back-propagation.
#[derive(Debug, Clone)]
struct LstmStep {
    x: Array1<f32>,
    h_prev: Array1<f32>,
    c_prev: Array1<f32>,
    /// Activated gates, stacked like the weight rows.
    gates: Array1<f32>,
    tanh_c: Array1<f32>,
}

/// A full pass of one cell over a sequence.
#[derive(Debug, Clone)]
pub struct LstmTrace {
    steps: Vec<LstmStep>,
    /// Hidden state after the last step.
    pub hidden: Array1<f32>,
}

impl LstmCell {
    pub fn new(inputs: usize, units: usize, rng: &mut InitRng) -> Self {
        let limit = (1.0 / units as f32).sqrt();
        let mut bias = Array1::zeros(4 * units);
        bias.slice_mut(s![units..2 * units]).fill(1.0);

        LstmCell {
            input_weights: uniform_matrix(4 * units, inputs, limit, rng),
            recurrent_weights: uniform_matrix(4 * units, units, limit, rng),
            bias,
        }
    }

    pub fn inputs(&self) -> usize {
        self.input_weights.ncols()
    }

    pub fn units(&self) -> usize {
        self.recurrent_weights.ncols()
    }

    /// One time step; returns the cached values and the new cell state.
    fn step(
        &self,
        x: ArrayView1<f32>,
        h_prev: Array1<f32>,
        c_prev: Array1<f32>,
    ) -> (LstmStep, Array1<f32>) {
        let u = self.units();
        let mut gates =
            self.input_weights.dot(&x) + self.recurrent_weights.dot(&h_prev) + &self.bias;
        gates.slice_mut(s![..2 * u]).mapv_inplace(sigmoid);
        gates.slice_mut(s![2 * u..3 * u]).mapv_inplace(f32::tanh);
        gates.slice_mut(s![3 * u..]).mapv_inplace(sigmoid);

        let c = &gates.slice(s![u..2 * u]) * &c_prev
            + &(&gates.slice(s![..u]) * &gates.slice(s![2 * u..3 * u]));
        let tanh_c = c.mapv(f32::tanh);

        let step = LstmStep {
            x: x.to_owned(),
            h_prev,
            c_prev,
            gates,
            tanh_c,
        };
        (step, c)
    }

    /// Run the cell from the zero state over `inputs`.
    pub fn run<'a, I>(&self, inputs: I) -> LstmTrace
    where
        I: IntoIterator<Item = ArrayView1<'a, f32>>,
    {
        let u = self.units();
        let mut h = Array1::zeros(u);
        let mut c = Array1::zeros(u);
        let mut steps = Vec::new();

        for x in inputs {
            let (step, c_next) = self.step(x, h, c);
            h = &step.gates.slice(s![3 * u..]) * &step.tanh_c;
            c = c_next;
            steps.push(step);
        }
        LstmTrace { steps, hidden: h }
    }

    /// Back-propagate `d_hidden`, the gradient at the final hidden state,
    /// through every step of `trace`. Returns the gradient of each input,
    /// in step order.
    pub fn backward(
        &self,
        trace: &LstmTrace,
        d_hidden: ArrayView1<f32>,
        grad: &mut LstmGrad,
    ) -> Vec<Array1<f32>> {
        let u = self.units();
        let mut dh = d_hidden.to_owned();
        let mut dc = Array1::<f32>::zeros(u);
        let mut d_inputs = Vec::with_capacity(trace.steps.len());

        for step in trace.steps.iter().rev() {
            let i = step.gates.slice(s![..u]);
            let f = step.gates.slice(s![u..2 * u]);
            let g = step.gates.slice(s![2 * u..3 * u]);
            let o = step.gates.slice(s![3 * u..]);

            let d_c = &dc + &(&dh * &o * &step.tanh_c.mapv(|t| 1.0 - t * t));
            let mut d_gates = Array1::<f32>::zeros(4 * u);
            d_gates
                .slice_mut(s![..u])
                .assign(&(&d_c * &g * &i.mapv(|v| v * (1.0 - v))));
            d_gates
                .slice_mut(s![u..2 * u])
                .assign(&(&d_c * &step.c_prev * &f.mapv(|v| v * (1.0 - v))));
            d_gates
                .slice_mut(s![2 * u..3 * u])
                .assign(&(&d_c * &i * &g.mapv(|v| 1.0 - v * v)));
            d_gates
                .slice_mut(s![3 * u..])
                .assign(&(&dh * &step.tanh_c * &o.mapv(|v| v * (1.0 - v))));

            accumulate_outer(&mut grad.input_weights, d_gates.view(), step.x.view());
            accumulate_outer(&mut grad.recurrent_weights, d_gates.view(), step.h_prev.view());
            grad.bias += &d_gates;

            d_inputs.push(self.input_weights.t().dot(&d_gates));
            dh = self.recurrent_weights.t().dot(&d_gates);
            dc = &d_c * &f;
        }

        d_inputs.reverse();
        d_inputs
    }

    pub fn zero_grad(&self) -> LstmGrad {
        LstmGrad {
            input_weights: Array2::zeros(self.input_weights.raw_dim()),
            recurrent_weights: Array2::zeros(self.recurrent_weights.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        }
    }

    pub fn apply(&mut self, grad: &LstmGrad, optimizer: &Optimizer, moments: &mut LstmMoments) {
        optimizer.update(&mut self.input_weights, &grad.input_weights, &mut moments.input_weights);
        optimizer.update(
            &mut self.recurrent_weights,
            &grad.recurrent_weights,
            &mut moments.recurrent_weights,
        );
        optimizer.update(&mut self.bias, &grad.bias, &mut moments.bias);
    }

    pub fn check_shape(&self, what: &str, inputs: usize, units: usize) -> Result<()> {
        check_shape(
            &format!("{what} input weights"),
            self.input_weights.shape(),
            &[4 * units, inputs],
        )?;
        check_shape(
            &format!("{what} recurrent weights"),
            self.recurrent_weights.shape(),
            &[4 * units, units],
        )?;
        check_shape(&format!("{what} bias"), self.bias.shape(), &[4 * units])
    }
}

#[derive(Debug, Clone)]
pub struct LstmGrad {
    input_weights: Array2<f32>,
    recurrent_weights: Array2<f32>,
    bias: Array1<f32>,
}

impl LstmGrad {
    fn merge(&mut self, other: &LstmGrad) {
        self.input_weights += &other.input_weights;
        self.recurrent_weights += &other.recurrent_weights;
        self.bias += &other.bias;
    }

    fn scale(&mut self, factor: f32) {
        self.input_weights *= factor;
        self.recurrent_weights *= factor;
        self.bias *= factor;
    }
}

#[derive(Debug, Clone, Default)]
pub struct LstmMoments {
    input_weights: Moments<Ix2>,
    recurrent_weights: Moments<Ix2>,
    bias: Moments<Ix1>,
}

pub struct BiLstmGradients {
    forward: LstmGrad,
    backward: LstmGrad,
    head: HeadGrad,
    embedding: RowGradients,
}

impl Gradients for BiLstmGradients {
    fn merge(&mut self, other: Self) {
        self.forward.merge(&other.forward);
        self.backward.merge(&other.backward);
        self.head.merge(&other.head);
        self.embedding.merge(other.embedding);
    }

    fn scale(&mut self, factor: f32) {
        self.forward.scale(factor);
        self.backward.scale(factor);
        self.head.scale(factor);
        self.embedding.scale(factor);
    }
}

#[derive(Default)]
pub struct BiLstmMoments {
    forward: LstmMoments,
    backward: LstmMoments,
    head: HeadMoments,
    embedding: Moments<Ix2>,
}

/// Both directions' traces and the concatenated final states.
struct Encoding {
    ids: Vec<u32>,
    forward: LstmTrace,
    backward: LstmTrace,
    features: Array1<f32>,
}

/// Embedding, bidirectional LSTM and a two-layer head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiLstmClassifier {
    config: ClassifierConfig,
    /// `vocab_size × embedding_dim`.
    embedding: Array2<f32>,
    forward_cell: LstmCell,
    backward_cell: LstmCell,
    head: Head,
    trained: bool,
    metadata: Option<ModelMetadata>,
}

impl BiLstmClassifier {
    /// Create an untrained classifier for ids in `0..vocab_size`.
    pub fn new(vocab_size: usize, config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        if vocab_size == 0 {
            return Err(VerityError::invalid_config("vocab_size must be at least 1"));
        }

        let mut rng = init_rng(config.seed);
        let dim = config.embedding_dim;
        let units = config.recurrent_units;

        Ok(BiLstmClassifier {
            config,
            embedding: uniform_matrix(vocab_size, dim, EMBEDDING_INIT_RANGE, &mut rng),
            forward_cell: LstmCell::new(dim, units, &mut rng),
            backward_cell: LstmCell::new(dim, units, &mut rng),
            head: Head::new(2 * units, config.hidden_units, &mut rng),
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
        let units = self.config.recurrent_units;
        if self.vocab_size() == 0 {
            return Err(VerityError::model("embedding table has no rows"));
        }
        check_shape("embedding", self.embedding.shape(), &[self.vocab_size(), dim])?;
        self.forward_cell.check_shape("forward LSTM", dim, units)?;
        self.backward_cell.check_shape("backward LSTM", dim, units)?;
        self.head.check_shape(2 * units, self.config.hidden_units)
    }

    fn encode(&self, row: &[u32]) -> Encoding {
        let ids: Vec<u32> = row.iter().copied().filter(|&id| id != 0).collect();
        let inputs: Vec<ArrayView1<f32>> = ids
            .iter()
            .map(|&id| self.embedding.row(id as usize))
            .collect();

        let forward = self.forward_cell.run(inputs.iter().copied());
        let backward = self.backward_cell.run(inputs.iter().rev().copied());

        let units = self.config.recurrent_units;
        let mut features = Array1::zeros(2 * units);
        features.slice_mut(s![..units]).assign(&forward.hidden);
        features.slice_mut(s![units..]).assign(&backward.hidden);

        Encoding {
            ids,
            forward,
            backward,
            features,
        }
    }
}

impl Network for BiLstmClassifier {
    type Gradients = BiLstmGradients;
    type Moments = BiLstmMoments;

    fn name(&self) -> &'static str {
        "bi_lstm"
    }

    fn vocab_size(&self) -> usize {
        self.embedding.nrows()
    }

    fn zero_gradients(&self) -> BiLstmGradients {
        BiLstmGradients {
            forward: self.forward_cell.zero_grad(),
            backward: self.backward_cell.zero_grad(),
            head: self.head.zero_grad(),
            embedding: RowGradients::default(),
        }
    }

    fn probability(&self, row: &[u32]) -> f32 {
        let encoding = self.encode(row);
        self.head.forward(encoding.features.view()).probability
    }

    fn backpropagate(&self, row: &[u32], target: f32, grads: &mut BiLstmGradients) -> f32 {
        let encoding = self.encode(row);
        let features = encoding.features.view();
        let act = self.head.forward(features);
        let d_features = self.head.backward(features, &act, target, &mut grads.head);

        let units = self.config.recurrent_units;
        let d_forward = self.forward_cell.backward(
            &encoding.forward,
            d_features.slice(s![..units]),
            &mut grads.forward,
        );
        let d_backward = self.backward_cell.backward(
            &encoding.backward,
            d_features.slice(s![units..]),
            &mut grads.backward,
        );

        if self.config.trainable_embedding {
            for (&id, d) in encoding.ids.iter().zip(&d_forward) {
                grads.embedding.add(id, d.view(), 1.0);
            }
            for (&id, d) in encoding.ids.iter().rev().zip(&d_backward) {
                grads.embedding.add(id, d.view(), 1.0);
            }
        }
        act.probability
    }

    fn apply(
        &mut self,
        grads: &BiLstmGradients,
        optimizer: &Optimizer,
        moments: &mut BiLstmMoments,
    ) {
        self.forward_cell.apply(&grads.forward, optimizer, &mut moments.forward);
        self.backward_cell.apply(&grads.backward, optimizer, &mut moments.backward);
        self.head.apply(&grads.head, optimizer, &mut moments.head);
        if self.config.trainable_embedding {
            optimizer.update_rows(&mut self.embedding, &grads.embedding, &mut moments.embedding);
        }
    }
}

impl SequenceClassifier for BiLstmClassifier {
    fn fit(&mut self, sequences: &SequenceMatrix, labels: &[Label]) -> Result<TrainingStats> {
        let config = self.config;
        let stats = trainer::train(self, &config, sequences, labels)?;
        self.trained = true;
        let metadata =
            trainer::training_metadata(Network::name(self), &config, self.vocab_size(), &stats)
                .with_hyperparameter("recurrent_units", config.recurrent_units as f64);
        self.metadata = Some(metadata);
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

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::config::PlateauConfig;

    fn toy_data() -> (SequenceMatrix, Vec<Label>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12u32 {
            if i % 2 == 0 {
                rows.push(vec![1 + i % 4, 1 + (i + 1) % 4, 1 + (i + 2) % 4, 0, 0]);
                labels.push(Label::Fake);
            } else {
                rows.push(vec![5 + i % 4, 5 + (i + 1) % 4, 0, 5 + (i + 2) % 4, 0]);
                labels.push(Label::Real);
            }
        }
        (SequenceMatrix::from_rows(rows, 5).unwrap(), labels)
    }

    fn toy_config() -> ClassifierConfig {
        ClassifierConfig::default()
            .with_embedding_dim(8)
            .with_recurrent_units(6)
            .with_hidden_units(8)
            .with_batch_size(4)
            .with_epochs(60)
            .with_learning_rate(0.02)
            .with_validation_split(0.0)
            .with_trainable_embedding(true)
            .with_plateau(PlateauConfig {
                patience: 1000,
                ..PlateauConfig::default()
            })
            .with_seed(17)
    }

    /// `sum(weights * h_final)` for the given inputs.
    fn weighted_output(cell: &LstmCell, inputs: &[Array1<f32>], weights: &Array1<f32>) -> f32 {
        cell.run(inputs.iter().map(|x| x.view())).hidden.dot(weights)
    }

    #[test]
    fn test_cell_gradients_match_finite_differences() {
        let mut cell = LstmCell::new(3, 2, &mut init_rng(Some(5)));
        let inputs = vec![
            array![0.5f32, -0.3, 0.8],
            array![-0.6f32, 0.2, 0.1],
            array![0.3f32, 0.9, -0.4],
        ];
        let weights = array![1.0f32, -0.7];

        let trace = cell.run(inputs.iter().map(|x| x.view()));
        let mut grad = cell.zero_grad();
        let d_inputs = cell.backward(&trace, weights.view(), &mut grad);
        assert_eq!(d_inputs.len(), 3);

        let eps = 1e-2f32;
        let tolerance = 2e-3f32;

        for (r, c) in [(0, 0), (3, 2), (5, 1), (7, 0)] {
            let original = cell.input_weights[[r, c]];
            cell.input_weights[[r, c]] = original + eps;
            let plus = weighted_output(&cell, &inputs, &weights);
            cell.input_weights[[r, c]] = original - eps;
            let minus = weighted_output(&cell, &inputs, &weights);
            cell.input_weights[[r, c]] = original;

            let numeric = (plus - minus) / (2.0 * eps);
            let analytic = grad.input_weights[[r, c]];
            assert!((numeric - analytic).abs() < tolerance, "W[{r},{c}]: {numeric} vs {analytic}");
        }

        for (r, c) in [(1, 1), (4, 0), (6, 1)] {
            let original = cell.recurrent_weights[[r, c]];
            cell.recurrent_weights[[r, c]] = original + eps;
            let plus = weighted_output(&cell, &inputs, &weights);
            cell.recurrent_weights[[r, c]] = original - eps;
            let minus = weighted_output(&cell, &inputs, &weights);
            cell.recurrent_weights[[r, c]] = original;

            let numeric = (plus - minus) / (2.0 * eps);
            let analytic = grad.recurrent_weights[[r, c]];
            assert!((numeric - analytic).abs() < tolerance, "U[{r},{c}]: {numeric} vs {analytic}");
        }

        for (t, k) in [(0, 0), (1, 2), (2, 1)] {
            let mut shifted = inputs.clone();
            shifted[t][k] += eps;
            let plus = weighted_output(&cell, &shifted, &weights);
            shifted[t][k] -= 2.0 * eps;
            let minus = weighted_output(&cell, &shifted, &weights);

            let numeric = (plus - minus) / (2.0 * eps);
            assert!(
                (numeric - d_inputs[t][k]).abs() < tolerance,
                "x[{t}][{k}]: {numeric} vs {}",
                d_inputs[t][k]
            );
        }
    }

    #[test]
    fn test_forget_bias_starts_at_one() {
        let cell = LstmCell::new(4, 3, &mut init_rng(Some(1)));
        assert_eq!(cell.bias.slice(s![3..6]), Array1::<f32>::ones(3));
        assert!(cell.bias.slice(s![..3]).iter().all(|&b| b == 0.0));
        assert_eq!((cell.inputs(), cell.units()), (4, 3));
    }

    #[test]
    fn test_empty_row_encodes_to_zero_state() {
        let model = BiLstmClassifier::new(9, toy_config()).unwrap();

        let encoding = model.encode(&[0, 0, 0]);

        assert!(encoding.ids.is_empty());
        assert!(encoding.features.iter().all(|&v| v == 0.0));
        let p = model.probability(&[0, 0, 0]);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_padding_is_masked() {
        let model = BiLstmClassifier::new(9, toy_config()).unwrap();

        assert_eq!(model.probability(&[3, 0, 5, 0]), model.probability(&[3, 5]));
        assert_ne!(model.probability(&[3, 5]), model.probability(&[5, 3]));
    }

    #[test]
    fn test_learns_separable_corpus() {
        let (sequences, labels) = toy_data();
        let mut model = BiLstmClassifier::new(9, toy_config()).unwrap();

        let stats = model.fit(&sequences, &labels).unwrap();
        let probabilities = model.predict_proba(&sequences).unwrap();

        assert_eq!(SequenceClassifier::name(&model), "bi_lstm");
        assert!(stats.final_training_loss().unwrap() < stats.training_losses[0]);
        for (p, label) in probabilities.iter().zip(&labels) {
            assert_eq!(*p > 0.5, label.is_fake(), "p = {p} for {label}");
        }
        let metadata = model.metadata().unwrap();
        assert_eq!(metadata.hyperparameters["recurrent_units"], 6.0);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (sequences, labels) = toy_data();
        let config = toy_config().with_epochs(4);

        let mut a = BiLstmClassifier::new(9, config).unwrap();
        let mut b = BiLstmClassifier::new(9, config).unwrap();
        a.fit(&sequences, &labels).unwrap();
        b.fit(&sequences, &labels).unwrap();

        assert_eq!(a.forward_cell, b.forward_cell);
        assert_eq!(
            a.predict_proba(&sequences).unwrap(),
            b.predict_proba(&sequences).unwrap()
        );
    }

    #[test]
    fn test_frozen_embedding_is_unchanged() {
        let (sequences, labels) = toy_data();
        let config = toy_config().with_epochs(3).with_trainable_embedding(false);
        let mut model = BiLstmClassifier::new(9, config).unwrap();
        let before = model.embedding.clone();
        let cell_before = model.backward_cell.clone();

        model.fit(&sequences, &labels).unwrap();

        assert_eq!(model.embedding, before);
        assert_ne!(model.backward_cell, cell_before);
    }

    #[test]
    fn test_validate_rejects_mismatched_shapes() {
        let mut model = BiLstmClassifier::new(9, toy_config()).unwrap();
        assert!(model.validate().is_ok());

        model.forward_cell = LstmCell::new(8, 5, &mut init_rng(Some(2)));
        assert!(matches!(model.validate(), Err(VerityError::Model(_))));

        let mut model = BiLstmClassifier::new(9, toy_config()).unwrap();
        model.embedding = Array2::zeros((9, 4));
        assert!(matches!(model.validate(), Err(VerityError::Model(_))));
    }

    #[test]
    fn test_serde_round_trip_keeps_predictions() {
        let (sequences, labels) = toy_data();
        let mut model = BiLstmClassifier::new(9, toy_config().with_epochs(2)).unwrap();
        model.fit(&sequences, &labels).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: BiLstmClassifier = serde_json::from_str(&json).unwrap();

        assert!(restored.is_trained());
        let before = model.predict_proba(&sequences).unwrap();
        let after = restored.predict_proba(&sequences).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
