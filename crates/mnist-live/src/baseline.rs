// SoftmaxRegression — multinomial logistic regression on flattened pixels
//
//   logits = X · W + b           X: [batch, rows·cols], W: [rows·cols, 10]
//   p      = softmax(logits)     row-wise, max-shifted for stability
//   loss   = -mean(sum(y · ln p))
//   dW     = Xᵀ · (p − y) / batch,  db = sum_rows(p − y) / batch
//
// Plain gradient descent, one step per batch.

use ndarray::{Array1, Array2, Array4, Axis};

use mnist_live_data::{argmax, Batch, NUM_CLASSES};

use crate::session::{Classifier, StepMetrics};

pub const DEFAULT_LEARNING_RATE: f32 = 0.5;

const LOG_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone)]
pub struct SoftmaxRegression {
    rows: usize,
    cols: usize,
    weights: Array2<f32>,
    bias: Array1<f32>,
    learning_rate: f32,
}

impl SoftmaxRegression {
    /// Zero-initialised model for `rows × cols` images.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            weights: Array2::zeros((rows * cols, NUM_CLASSES)),
            bias: Array1::zeros(NUM_CLASSES),
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// `[batch, rows, cols, 1]` → `[batch, rows·cols]`.
    ///
    /// # Panics
    /// Panics if the images are not `rows × cols`.
    fn flatten(&self, xs: &Array4<f32>) -> Array2<f32> {
        let shape = xs.shape();
        assert_eq!(
            (shape[1], shape[2]),
            (self.rows, self.cols),
            "image size does not match the model"
        );
        let cols = self.cols;
        Array2::from_shape_fn((shape[0], self.rows * cols), |(b, i)| {
            xs[[b, i / cols, i % cols, 0]]
        })
    }

    fn probabilities(&self, flat: &Array2<f32>) -> Array2<f32> {
        let mut logits = flat.dot(&self.weights) + &self.bias;
        for mut row in logits.rows_mut() {
            let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        logits
    }
}

fn metrics(probs: &Array2<f32>, ys: &Array2<f32>) -> StepMetrics {
    let n = probs.nrows();
    if n == 0 {
        return StepMetrics::default();
    }
    let loss: f32 = -(ys * &probs.mapv(|p| (p + LOG_EPSILON).ln())).sum() / n as f32;
    let correct = probs
        .rows()
        .into_iter()
        .zip(ys.rows())
        .filter(|(p, y)| argmax(p.view()) == argmax(y.view()))
        .count();
    StepMetrics {
        loss: loss as f64,
        accuracy: correct as f64 / n as f64,
    }
}

impl Classifier for SoftmaxRegression {
    fn train_batch(&mut self, batch: &Batch) -> StepMetrics {
        let flat = self.flatten(&batch.xs);
        let probs = self.probabilities(&flat);
        let step = metrics(&probs, &batch.ys);

        let n = flat.nrows().max(1) as f32;
        let delta = &probs - &batch.ys;
        let grad_w = flat.t().dot(&delta) / n;
        let grad_b = delta.sum_axis(Axis(0)) / n;
        self.weights.scaled_add(-self.learning_rate, &grad_w);
        self.bias.scaled_add(-self.learning_rate, &grad_b);
        step
    }

    fn evaluate(&self, xs: &Array4<f32>, ys: &Array2<f32>) -> StepMetrics {
        let probs = self.probabilities(&self.flatten(xs));
        metrics(&probs, ys)
    }
}
