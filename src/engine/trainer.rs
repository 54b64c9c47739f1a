//! Mini-batch fit loop

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::Instant;

use super::network::{LayerGradient, Network};
use super::plan::{EpochSummary, Optimizer, TrainingHistory, TrainingInfo, TrainingPlan};
use crate::dataset::{Batch, Partition, TabularDataset};
use crate::error::{Result, TabRegError};

/// Per-layer optimizer state
enum OptimizerState {
    Sgd {
        velocity: Vec<LayerGradient>,
    },
    Adam {
        first: Vec<LayerGradient>,
        second: Vec<LayerGradient>,
        step: i32,
    },
}

impl OptimizerState {
    fn new(optimizer: &Optimizer, network: &Network) -> Self {
        let zeros = || -> Vec<LayerGradient> {
            network
                .params()
                .weights
                .iter()
                .zip(&network.params().biases)
                .map(|(w, b)| (Array2::zeros(w.raw_dim()), Array1::zeros(b.len())))
                .collect()
        };
        match optimizer {
            Optimizer::Sgd { .. } => OptimizerState::Sgd { velocity: zeros() },
            Optimizer::Adam { .. } => OptimizerState::Adam {
                first: zeros(),
                second: zeros(),
                step: 0,
            },
        }
    }
}

/// Runs a [`TrainingPlan`] against a network
pub struct Trainer {
    plan: TrainingPlan,
    rng: Xoshiro256PlusPlus,
}

impl Trainer {
    pub fn new(plan: TrainingPlan, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Self { plan, rng }
    }

    pub fn plan(&self) -> &TrainingPlan {
        &self.plan
    }

    /// Train for `epochs` passes over `train`, evaluating on `validation`
    /// after each one
    pub fn fit(
        &mut self,
        network: &mut Network,
        epochs: usize,
        dataset: &TabularDataset,
        train: &Partition,
        validation: &Partition,
    ) -> Result<TrainingHistory> {
        if dataset.feature_size() != network.input_dim() {
            return Err(TabRegError::ShapeError {
                expected: format!("{} inputs", network.input_dim()),
                actual: format!("{} dataset features", dataset.feature_size()),
            });
        }
        if train.is_empty() {
            return Err(TabRegError::Training("Training partition is empty".to_string()));
        }

        let info = TrainingInfo {
            epochs,
            train_size: train.len(),
            validation_size: validation.len(),
            parameters: network.topology().num_parameters(),
        };
        for listener in self.plan.listeners.iter_mut() {
            listener.on_training_begin(&info);
        }

        let mut state = OptimizerState::new(&self.plan.optimizer, network);
        let validation_batch = (!validation.is_empty()).then(|| validation.to_batch(dataset));
        let mut history = TrainingHistory::default();

        for epoch in 1..=epochs {
            let started = Instant::now();
            let batches: Vec<Batch> = train.batches(dataset, &mut self.rng).collect();

            let mut loss_sum = 0.0;
            for batch in &batches {
                let y = batch.y.clone().insert_axis(Axis(1));
                let (activations, z_values) = network.forward(&batch.x);
                loss_sum += self.plan.loss.evaluate(&activations[activations.len() - 1], &y)
                    * batch.x.nrows() as f64;

                let mut gradients = network.backward(&y, &activations, &z_values, &self.plan.loss);
                if let Some(clip) = self.plan.gradient_clip {
                    clip_gradients(&mut gradients, clip);
                }
                self.apply(network, &mut state, gradients);
            }
            let train_loss = loss_sum / train.len() as f64;

            let validation_loss = validation_batch.as_ref().map(|batch| {
                let y = batch.y.clone().insert_axis(Axis(1));
                self.plan.loss.evaluate(&network.predict(&batch.x), &y)
            });

            if !train_loss.is_finite() || validation_loss.map_or(false, |v| !v.is_finite()) {
                return Err(TabRegError::Training(format!(
                    "Loss diverged at epoch {} (train: {}, validation: {:?})",
                    epoch, train_loss, validation_loss
                )));
            }

            let summary = EpochSummary {
                epoch,
                train_loss,
                validation_loss,
                elapsed: started.elapsed(),
            };
            for listener in self.plan.listeners.iter_mut() {
                listener.on_epoch(&summary);
            }
            history.epochs.push(summary);
        }

        for listener in self.plan.listeners.iter_mut() {
            listener.on_training_end(&history);
        }
        Ok(history)
    }

    fn apply(&self, network: &mut Network, state: &mut OptimizerState, gradients: Vec<LayerGradient>) {
        let decay = 1.0 - self.plan.weight_decay * self.plan.optimizer.learning_rate();
        let params = network.params_mut();

        match (&self.plan.optimizer, state) {
            (Optimizer::Sgd { learning_rate, momentum }, OptimizerState::Sgd { velocity }) => {
                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    let (vel_w, vel_b) = &mut velocity[i];
                    *vel_w = &*vel_w * *momentum - &grad_w * *learning_rate;
                    *vel_b = &*vel_b * *momentum - &grad_b * *learning_rate;
                    params.weights[i] += &*vel_w;
                    params.biases[i] += &*vel_b;
                }
            }
            (
                Optimizer::Adam { learning_rate, beta1, beta2, epsilon },
                OptimizerState::Adam { first, second, step },
            ) => {
                *step += 1;
                let bias1 = 1.0 - beta1.powi(*step);
                let bias2 = 1.0 - beta2.powi(*step);
                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    let (m_w, m_b) = &mut first[i];
                    let (v_w, v_b) = &mut second[i];
                    *m_w = &*m_w * *beta1 + &grad_w * (1.0 - beta1);
                    *m_b = &*m_b * *beta1 + &grad_b * (1.0 - beta1);
                    *v_w = &*v_w * *beta2 + &grad_w.mapv(|g| g * g) * (1.0 - beta2);
                    *v_b = &*v_b * *beta2 + &grad_b.mapv(|g| g * g) * (1.0 - beta2);

                    let eps = *epsilon;
                    let step_w = ndarray::Zip::from(&*m_w)
                        .and(&*v_w)
                        .map_collect(|m, v| (m / bias1) / ((v / bias2).sqrt() + eps));
                    let step_b = ndarray::Zip::from(&*m_b)
                        .and(&*v_b)
                        .map_collect(|m, v| (m / bias1) / ((v / bias2).sqrt() + eps));
                    params.weights[i].scaled_add(-*learning_rate, &step_w);
                    params.biases[i].scaled_add(-*learning_rate, &step_b);
                }
            }
            // state is always built from the same optimizer
            _ => unreachable!("optimizer state does not match optimizer"),
        }

        if self.plan.weight_decay > 0.0 {
            for w in params.weights.iter_mut() {
                *w *= decay;
            }
        }
    }
}

fn clip_gradients(gradients: &mut [LayerGradient], max_norm: f64) {
    let norm = gradients
        .iter()
        .map(|(w, b)| w.iter().map(|v| v * v).sum::<f64>() + b.iter().map(|v| v * v).sum::<f64>())
        .sum::<f64>()
        .sqrt();
    if norm > max_norm && norm > 0.0 {
        let scale = max_norm / norm;
        for (w, b) in gradients.iter_mut() {
            *w *= scale;
            *b *= scale;
        }
    }
}
