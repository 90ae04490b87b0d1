//! The feed-forward network and its optimizer.
//!
//! Architecture, sized from the input feature count `n`:
//! `Dense(0.75n, relu) -> Dropout(0.1) -> Dense(0.5n, relu) -> Dense(1, sigmoid)`,
//! trained with binary cross-entropy under RMSprop.

use rand::rngs::StdRng;
use rand::Rng;

use crate::data::Matrix;

/// RMSprop hyperparameters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RmsProp {
    pub learning_rate: f64,
    pub rho: f64,
    pub epsilon: f64,
}

impl Default for RmsProp {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            rho: 0.9,
            epsilon: 1e-7,
        }
    }
}

/// One fully connected layer with per-batch gradient accumulators and the
/// RMSprop second-moment caches.
#[derive(Debug, Clone)]
struct DenseLayer {
    in_dim: usize,
    out_dim: usize,
    /// `out_dim x in_dim`, row-major by output unit.
    weights: Vec<f64>,
    bias: Vec<f64>,
    grad_w: Vec<f64>,
    grad_b: Vec<f64>,
    cache_w: Vec<f64>,
    cache_b: Vec<f64>,
}

impl DenseLayer {
    /// Glorot-uniform initialized layer.
    fn new(in_dim: usize, out_dim: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (in_dim + out_dim) as f64).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();
        Self {
            in_dim,
            out_dim,
            weights,
            bias: vec![0.0; out_dim],
            grad_w: vec![0.0; in_dim * out_dim],
            grad_b: vec![0.0; out_dim],
            cache_w: vec![0.0; in_dim * out_dim],
            cache_b: vec![0.0; out_dim],
        }
    }

    /// Pre-activation output `W·x + b`.
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.in_dim);
        let mut out = Vec::with_capacity(self.out_dim);
        for o in 0..self.out_dim {
            let w = &self.weights[o * self.in_dim..(o + 1) * self.in_dim];
            let z: f64 = w.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + self.bias[o];
            out.push(z);
        }
        out
    }

    fn zero_grads(&mut self) {
        self.grad_w.iter_mut().for_each(|g| *g = 0.0);
        self.grad_b.iter_mut().for_each(|g| *g = 0.0);
    }

    /// Accumulate gradients for one sample given the pre-activation deltas.
    fn accumulate(&mut self, delta: &[f64], input: &[f64]) {
        for (o, &d) in delta.iter().enumerate() {
            let row = &mut self.grad_w[o * self.in_dim..(o + 1) * self.in_dim];
            for (g, &x) in row.iter_mut().zip(input) {
                *g += d * x;
            }
            self.grad_b[o] += d;
        }
    }

    /// Gradient with respect to the layer input.
    fn backprop_input(&self, delta: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.in_dim];
        for (o, &d) in delta.iter().enumerate() {
            let row = &self.weights[o * self.in_dim..(o + 1) * self.in_dim];
            for (acc, &w) in out.iter_mut().zip(row) {
                *acc += d * w;
            }
        }
        out
    }

    /// Apply one RMSprop step from the accumulated gradients, averaged over
    /// `batch` samples, then reset the accumulators.
    fn step(&mut self, opt: &RmsProp, batch: f64) {
        fn update(
            params: &mut [f64],
            grads: &mut [f64],
            caches: &mut [f64],
            opt: &RmsProp,
            batch: f64,
        ) {
            for ((p, g), c) in params.iter_mut().zip(grads.iter_mut()).zip(caches) {
                let g = *g / batch;
                *c = opt.rho * *c + (1.0 - opt.rho) * g * g;
                *p -= opt.learning_rate * g / (c.sqrt() + opt.epsilon);
            }
        }
        update(
            &mut self.weights,
            &mut self.grad_w,
            &mut self.cache_w,
            opt,
            batch,
        );
        update(&mut self.bias, &mut self.grad_b, &mut self.cache_b, opt, batch);
        self.zero_grads();
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// The feed-forward binary classifier.
#[derive(Debug, Clone)]
pub struct Mlp {
    l1: DenseLayer,
    l2: DenseLayer,
    l3: DenseLayer,
    dropout_rate: f64,
}

impl Mlp {
    /// Build a network for `num_features` inputs with freshly initialized
    /// weights.
    pub fn new(num_features: usize, rng: &mut StdRng) -> Self {
        let h1 = ((num_features as f64 * 0.75) as usize).max(1);
        let h2 = ((num_features as f64 * 0.5) as usize).max(1);
        Self {
            l1: DenseLayer::new(num_features, h1, rng),
            l2: DenseLayer::new(h1, h2, rng),
            l3: DenseLayer::new(h2, 1, rng),
            dropout_rate: 0.1,
        }
    }

    /// Number of input features the network expects.
    pub fn num_features(&self) -> usize {
        self.l1.in_dim
    }

    /// Predicted probability for one feature row (inference path, no
    /// dropout).
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut a1 = self.l1.forward(row);
        a1.iter_mut().for_each(|z| *z = z.max(0.0));
        let mut a2 = self.l2.forward(&a1);
        a2.iter_mut().for_each(|z| *z = z.max(0.0));
        sigmoid(self.l3.forward(&a2)[0])
    }

    /// Predicted probabilities for every row of a matrix.
    pub fn predict(&self, matrix: &Matrix) -> Vec<f64> {
        matrix.rows().map(|row| self.predict_row(row)).collect()
    }

    /// Run one minibatch of forward/backward passes and apply a single
    /// RMSprop step averaged over the batch.
    pub(crate) fn train_batch(
        &mut self,
        features: &Matrix,
        indices: &[usize],
        labels: &[f64],
        opt: &RmsProp,
        rng: &mut StdRng,
    ) {
        if indices.is_empty() {
            return;
        }
        let keep = 1.0 - self.dropout_rate;

        for &i in indices {
            let row = features.row_slice(i);
            let y = labels[i];

            // Forward, keeping intermediates for the backward pass.
            let z1 = self.l1.forward(row);
            // Inverted dropout on the first hidden activation.
            let mask: Vec<f64> = (0..z1.len())
                .map(|_| {
                    if rng.gen::<f64>() < self.dropout_rate {
                        0.0
                    } else {
                        1.0 / keep
                    }
                })
                .collect();
            let a1: Vec<f64> = z1
                .iter()
                .zip(&mask)
                .map(|(&z, &m)| z.max(0.0) * m)
                .collect();
            let z2 = self.l2.forward(&a1);
            let a2: Vec<f64> = z2.iter().map(|&z| z.max(0.0)).collect();
            let p = sigmoid(self.l3.forward(&a2)[0]);

            // Backward. Sigmoid + cross-entropy collapses to `p - y` at the
            // output pre-activation.
            let d3 = [p - y];
            self.l3.accumulate(&d3, &a2);

            let da2 = self.l3.backprop_input(&d3);
            let dz2: Vec<f64> = da2
                .iter()
                .zip(&z2)
                .map(|(&d, &z)| if z > 0.0 { d } else { 0.0 })
                .collect();
            self.l2.accumulate(&dz2, &a1);

            let da1 = self.l2.backprop_input(&dz2);
            let dz1: Vec<f64> = da1
                .iter()
                .zip(&z1)
                .zip(&mask)
                .map(|((&d, &z), &m)| if z > 0.0 { d * m } else { 0.0 })
                .collect();
            self.l1.accumulate(&dz1, row);
        }

        let batch = indices.len() as f64;
        self.l1.step(opt, batch);
        self.l2.step(opt, batch);
        self.l3.step(opt, batch);
    }
}
