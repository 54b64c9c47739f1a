//! Feed-forward network with backpropagation

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::plan::Loss;
use super::topology::{Activation, NetworkTopology};
use crate::error::{Result, TabRegError};

/// Trainable parameters, layer by layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub weights: Vec<Array2<f64>>,
    pub biases: Vec<Array1<f64>>,
}

/// Gradients for one layer
pub(crate) type LayerGradient = (Array2<f64>, Array1<f64>);

/// Multi-layer perceptron built from a [`NetworkTopology`]
#[derive(Debug, Clone)]
pub struct Network {
    topology: NetworkTopology,
    params: NetworkParams,
}

impl Network {
    /// Glorot-initialised network
    pub fn new(topology: NetworkTopology, seed: Option<u64>) -> Result<Self> {
        topology.validate()?;

        let mut rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let sizes = topology.layer_sizes();
        let mut weights = Vec::with_capacity(sizes.len() - 1);
        let mut biases = Vec::with_capacity(sizes.len() - 1);
        for pair in sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let values: Vec<f64> = (0..n_in * n_out)
                .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
                .collect();
            weights.push(Array2::from_shape_vec((n_in, n_out), values)?);
            biases.push(Array1::zeros(n_out));
        }

        Ok(Self {
            topology,
            params: NetworkParams { weights, biases },
        })
    }

    /// Rebuild from persisted parameters, checking every layer's shape
    pub fn from_parts(topology: NetworkTopology, params: NetworkParams) -> Result<Self> {
        topology.validate()?;
        let sizes = topology.layer_sizes();
        let layers = sizes.len() - 1;
        if params.weights.len() != layers || params.biases.len() != layers {
            return Err(TabRegError::ShapeError {
                expected: format!("{} layers", layers),
                actual: format!("{} weights, {} biases", params.weights.len(), params.biases.len()),
            });
        }
        for (i, pair) in sizes.windows(2).enumerate() {
            let w = &params.weights[i];
            if w.dim() != (pair[0], pair[1]) || params.biases[i].len() != pair[1] {
                return Err(TabRegError::ShapeError {
                    expected: format!("layer {}: {}x{}", i, pair[0], pair[1]),
                    actual: format!("{}x{} (bias {})", w.nrows(), w.ncols(), params.biases[i].len()),
                });
            }
        }
        Ok(Self { topology, params })
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn input_dim(&self) -> usize {
        self.topology.input_dim
    }

    /// Batch prediction: one output row per input row
    pub fn predict(&self, x: &Array2<f64>) -> Array2<f64> {
        let (mut activations, _) = self.forward(x);
        activations.pop().unwrap_or_else(|| x.clone())
    }

    /// Prediction for a single encoded input; returns the first output
    pub fn predict_one(&self, x: &Array1<f64>) -> Result<f64> {
        if x.len() != self.topology.input_dim {
            return Err(TabRegError::ShapeError {
                expected: format!("{} inputs", self.topology.input_dim),
                actual: format!("{} inputs", x.len()),
            });
        }
        let row = x.clone().insert_axis(Axis(0));
        Ok(self.predict(&row)[[0, 0]])
    }

    pub(crate) fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let layers = self.params.weights.len();
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::with_capacity(layers);

        for (i, (w, b)) in self.params.weights.iter().zip(&self.params.biases).enumerate() {
            let z = activations[i].dot(w) + b;
            let a = if i < layers - 1 {
                activate(&z, self.topology.activation)
            } else {
                z.clone() // linear output for regression
            };
            z_values.push(z);
            activations.push(a);
        }

        (activations, z_values)
    }

    pub(crate) fn backward(
        &self,
        y: &Array2<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
        loss: &Loss,
    ) -> Vec<LayerGradient> {
        let layers = self.params.weights.len();
        let mut gradients = Vec::with_capacity(layers);

        let output = &activations[layers];
        let mut delta = loss.gradient(output, y);

        for i in (0..layers).rev() {
            let a_prev = &activations[i];
            let grad_w = a_prev.t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            gradients.push((grad_w, grad_b));

            if i > 0 {
                let z = &z_values[i - 1];
                delta = delta.dot(&self.params.weights[i].t())
                    * activate_derivative(z, self.topology.activation);
            }
        }

        gradients.reverse();
        gradients
    }

    pub(crate) fn params_mut(&mut self) -> &mut NetworkParams {
        &mut self.params
    }
}

fn activate(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| v.max(0.0)),
        Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => z.mapv(|v| v.tanh()),
        Activation::Linear => z.clone(),
    }
}

fn activate_derivative(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
        Activation::Sigmoid => {
            let sig = activate(z, Activation::Sigmoid);
            &sig * &(1.0 - &sig)
        }
        Activation::Tanh => {
            let t = z.mapv(|v| v.tanh());
            1.0 - &t * &t
        }
        Activation::Linear => Array2::ones(z.raw_dim()),
    }
}
