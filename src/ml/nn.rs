//! Building blocks shared by the built-in classifiers.
//!
//! Weights live in `ndarray` arrays. A [`Dense`] layer maps `inputs` to
//! `outputs` with a weight matrix of shape `outputs × inputs`, so a forward
//! pass is a single `weights.dot(x) + bias`. Gradients are accumulated into
//! arrays of the same shapes and applied by an [`Optimizer`].

use ahash::AHashMap;
use ndarray::linalg::general_mat_mul;
use ndarray::{Array, Array1, Array2, ArrayView1, Axis, Dimension, Ix1, Ix2, Zip};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};

/// Random source for weight initialization.
pub type InitRng = StdRng;

const PROBABILITY_EPSILON: f32 = 1e-7;

const ADAM_BETA1: f32 = 0.9;
const ADAM_BETA2: f32 = 0.999;
const ADAM_EPSILON: f32 = 1e-7;

/// Seeded initialization source; a seed is drawn when none is given.
pub fn init_rng(seed: Option<u64>) -> InitRng {
    InitRng::seed_from_u64(seed.unwrap_or_else(rand::random::<u64>))
}

/// Uniform `[-limit, limit)` matrix.
pub fn uniform_matrix(rows: usize, cols: usize, limit: f32, rng: &mut InitRng) -> Array2<f32> {
    Array2::random_using((rows, cols), Uniform::new(-limit, limit), rng)
}

pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

pub fn binary_cross_entropy(probability: f32, target: f32) -> f32 {
    let p = probability.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
    -(target * p.ln() + (1.0 - target) * (1.0 - p).ln())
}

/// `grad += column ⊗ row`.
pub fn accumulate_outer(grad: &mut Array2<f32>, column: ArrayView1<f32>, row: ArrayView1<f32>) {
    general_mat_mul(
        1.0,
        &column.insert_axis(Axis(1)),
        &row.insert_axis(Axis(0)),
        1.0,
        grad,
    );
}

/// Fails with a model error unless `actual == expected`.
pub fn check_shape(what: &str, actual: &[usize], expected: &[usize]) -> Result<()> {
    if actual != expected {
        return Err(VerityError::model(format!(
            "{what} has shape {actual:?}, expected {expected:?}"
        )));
    }
    Ok(())
}

/// Update rule applied to every trainable array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// Plain gradient descent.
    Sgd,
    /// Adam with bias-corrected moment estimates.
    #[default]
    Adam,
}

/// First and second moment estimates of one array.
#[derive(Debug, Clone)]
pub struct Moments<D: Dimension> {
    m: Option<Array<f32, D>>,
    v: Option<Array<f32, D>>,
}

impl<D: Dimension> Default for Moments<D> {
    fn default() -> Self {
        Moments { m: None, v: None }
    }
}

/// Applies gradients with the configured rule and learning rate.
#[derive(Debug, Clone)]
pub struct Optimizer {
    kind: OptimizerKind,
    learning_rate: f32,
    step: i32,
}

impl Optimizer {
    pub fn new(kind: OptimizerKind, learning_rate: f32) -> Self {
        Optimizer {
            kind,
            learning_rate,
            step: 0,
        }
    }

    pub fn kind(&self) -> OptimizerKind {
        self.kind
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    /// Start a new update. Called once per mini-batch, before the arrays
    /// are updated.
    pub fn next_step(&mut self) {
        self.step = self.step.saturating_add(1);
    }

    fn bias_corrections(&self) -> (f32, f32) {
        let t = self.step.max(1);
        (
            1.0 / (1.0 - ADAM_BETA1.powi(t)),
            1.0 / (1.0 - ADAM_BETA2.powi(t)),
        )
    }

    /// Update `param` against `grad`.
    pub fn update<D: Dimension>(
        &self,
        param: &mut Array<f32, D>,
        grad: &Array<f32, D>,
        moments: &mut Moments<D>,
    ) {
        match self.kind {
            OptimizerKind::Sgd => param.scaled_add(-self.learning_rate, grad),
            OptimizerKind::Adam => {
                let (m_scale, v_scale) = self.bias_corrections();
                let lr = self.learning_rate;
                let m = moments.m.get_or_insert_with(|| Array::zeros(param.raw_dim()));
                let v = moments.v.get_or_insert_with(|| Array::zeros(param.raw_dim()));
                Zip::from(param)
                    .and(m)
                    .and(v)
                    .and(grad)
                    .for_each(|p, m, v, &g| adam_step(p, m, v, g, lr, m_scale, v_scale));
            }
        }
    }

    /// Update only the rows of `table` that received a gradient.
    pub fn update_rows(
        &self,
        table: &mut Array2<f32>,
        rows: &RowGradients,
        moments: &mut Moments<Ix2>,
    ) {
        match self.kind {
            OptimizerKind::Sgd => {
                for (&id, grad) in &rows.rows {
                    table.row_mut(id as usize).scaled_add(-self.learning_rate, grad);
                }
            }
            OptimizerKind::Adam => {
                let (m_scale, v_scale) = self.bias_corrections();
                let lr = self.learning_rate;
                let m = moments.m.get_or_insert_with(|| Array2::zeros(table.raw_dim()));
                let v = moments.v.get_or_insert_with(|| Array2::zeros(table.raw_dim()));
                for (&id, grad) in &rows.rows {
                    let i = id as usize;
                    Zip::from(table.row_mut(i))
                        .and(m.row_mut(i))
                        .and(v.row_mut(i))
                        .and(grad)
                        .for_each(|p, m, v, &g| adam_step(p, m, v, g, lr, m_scale, v_scale));
                }
            }
        }
    }
}

#[inline]
fn adam_step(p: &mut f32, m: &mut f32, v: &mut f32, g: f32, lr: f32, m_scale: f32, v_scale: f32) {
    *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
    *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
    *p -= lr * (*m * m_scale) / ((*v * v_scale).sqrt() + ADAM_EPSILON);
}

/// Sparse gradient of an embedding table, keyed by row id.
#[derive(Debug, Clone, Default)]
pub struct RowGradients {
    rows: AHashMap<u32, Array1<f32>>,
}

impl RowGradients {
    /// `rows[id] += scale * grad`.
    pub fn add(&mut self, id: u32, grad: ArrayView1<f32>, scale: f32) {
        match self.rows.get_mut(&id) {
            Some(row) => row.scaled_add(scale, &grad),
            None => {
                self.rows.insert(id, &grad * scale);
            }
        }
    }

    pub fn merge(&mut self, other: RowGradients) {
        for (id, grad) in other.rows {
            match self.rows.get_mut(&id) {
                Some(row) => *row += &grad,
                None => {
                    self.rows.insert(id, grad);
                }
            }
        }
    }

    pub fn scale(&mut self, factor: f32) {
        for row in self.rows.values_mut() {
            *row *= factor;
        }
    }

    pub fn get(&self, id: u32) -> Option<&Array1<f32>> {
        self.rows.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fully connected layer without activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    /// `outputs × inputs`.
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl Dense {
    /// Glorot-uniform weights, zero bias.
    pub fn new(inputs: usize, outputs: usize, rng: &mut InitRng) -> Self {
        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
        Dense {
            weights: uniform_matrix(outputs, inputs, limit, rng),
            bias: Array1::zeros(outputs),
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn forward(&self, x: ArrayView1<f32>) -> Array1<f32> {
        self.weights.dot(&x) + &self.bias
    }

    /// Accumulate the parameter gradients for `d_out` and return the
    /// gradient with respect to `x`.
    pub fn backward(
        &self,
        x: ArrayView1<f32>,
        d_out: ArrayView1<f32>,
        grad: &mut DenseGrad,
    ) -> Array1<f32> {
        accumulate_outer(&mut grad.weights, d_out, x);
        grad.bias += &d_out;
        self.weights.t().dot(&d_out)
    }

    pub fn zero_grad(&self) -> DenseGrad {
        DenseGrad {
            weights: Array2::zeros(self.weights.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        }
    }

    pub fn apply(&mut self, grad: &DenseGrad, optimizer: &Optimizer, moments: &mut DenseMoments) {
        optimizer.update(&mut self.weights, &grad.weights, &mut moments.weights);
        optimizer.update(&mut self.bias, &grad.bias, &mut moments.bias);
    }

    pub fn check_shape(&self, what: &str, inputs: usize, outputs: usize) -> Result<()> {
        check_shape(&format!("{what} weights"), self.weights.shape(), &[outputs, inputs])?;
        check_shape(&format!("{what} bias"), self.bias.shape(), &[outputs])
    }
}

#[derive(Debug, Clone)]
pub struct DenseGrad {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl DenseGrad {
    pub fn merge(&mut self, other: &DenseGrad) {
        self.weights += &other.weights;
        self.bias += &other.bias;
    }

    pub fn scale(&mut self, factor: f32) {
        self.weights *= factor;
        self.bias *= factor;
    }
}

#[derive(Debug, Clone, Default)]
pub struct DenseMoments {
    weights: Moments<Ix2>,
    bias: Moments<Ix1>,
}

/// Output of [`Head::forward`].
#[derive(Debug, Clone)]
pub struct HeadActivations {
    pub hidden: Array1<f32>,
    pub probability: f32,
}

/// `dense (ReLU) → dense (sigmoid)` on a feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Head {
    hidden: Dense,
    output: Dense,
}

impl Head {
    pub fn new(inputs: usize, hidden_units: usize, rng: &mut InitRng) -> Self {
        Head {
            hidden: Dense::new(inputs, hidden_units, rng),
            output: Dense::new(hidden_units, 1, rng),
        }
    }

    pub fn inputs(&self) -> usize {
        self.hidden.inputs()
    }

    pub fn forward(&self, features: ArrayView1<f32>) -> HeadActivations {
        let hidden = self.hidden.forward(features).mapv(|z| z.max(0.0));
        let logit = self.output.forward(hidden.view())[0];
        HeadActivations {
            hidden,
            probability: sigmoid(logit),
        }
    }

    /// Gradient of the binary cross-entropy against `target`, returned with
    /// respect to `features`.
    pub fn backward(
        &self,
        features: ArrayView1<f32>,
        act: &HeadActivations,
        target: f32,
        grad: &mut HeadGrad,
    ) -> Array1<f32> {
        let d_logit = Array1::from_elem(1, act.probability - target);
        let mut d_hidden = self
            .output
            .backward(act.hidden.view(), d_logit.view(), &mut grad.output);
        Zip::from(&mut d_hidden).and(&act.hidden).for_each(|d, &h| {
            if h <= 0.0 {
                *d = 0.0;
            }
        });
        self.hidden.backward(features, d_hidden.view(), &mut grad.hidden)
    }

    pub fn zero_grad(&self) -> HeadGrad {
        HeadGrad {
            hidden: self.hidden.zero_grad(),
            output: self.output.zero_grad(),
        }
    }

    pub fn apply(&mut self, grad: &HeadGrad, optimizer: &Optimizer, moments: &mut HeadMoments) {
        self.hidden.apply(&grad.hidden, optimizer, &mut moments.hidden);
        self.output.apply(&grad.output, optimizer, &mut moments.output);
    }

    pub fn check_shape(&self, inputs: usize, hidden_units: usize) -> Result<()> {
        self.hidden.check_shape("hidden layer", inputs, hidden_units)?;
        self.output.check_shape("output layer", hidden_units, 1)
    }
}

#[derive(Debug, Clone)]
pub struct HeadGrad {
    hidden: DenseGrad,
    output: DenseGrad,
}

impl HeadGrad {
    pub fn merge(&mut self, other: &HeadGrad) {
        self.hidden.merge(&other.hidden);
        self.output.merge(&other.output);
    }

    pub fn scale(&mut self, factor: f32) {
        self.hidden.scale(factor);
        self.output.scale(factor);
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadMoments {
    hidden: DenseMoments,
    output: DenseMoments,
}
