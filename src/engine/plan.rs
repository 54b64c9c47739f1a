//! Training plans: loss, optimizer and progress listeners

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Regression loss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Loss {
    /// Half mean squared error
    L2,
    /// Mean absolute error
    L1,
    /// Squared near zero, absolute beyond `delta`
    Huber { delta: f64 },
}

impl Default for Loss {
    fn default() -> Self {
        Loss::L2
    }
}

impl Loss {
    /// Loss averaged over rows
    pub fn evaluate(&self, prediction: &Array2<f64>, target: &Array2<f64>) -> f64 {
        let n = prediction.nrows().max(1) as f64;
        let total: f64 = prediction
            .iter()
            .zip(target.iter())
            .map(|(p, t)| {
                let d = p - t;
                match self {
                    Loss::L2 => 0.5 * d * d,
                    Loss::L1 => d.abs(),
                    Loss::Huber { delta } => {
                        if d.abs() <= *delta {
                            0.5 * d * d
                        } else {
                            delta * (d.abs() - 0.5 * delta)
                        }
                    }
                }
            })
            .sum();
        total / n
    }

    /// Derivative of [`Loss::evaluate`] with respect to the prediction
    pub fn gradient(&self, prediction: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let n = prediction.nrows().max(1) as f64;
        let diff = prediction - target;
        match self {
            Loss::L2 => diff / n,
            Loss::L1 => diff.mapv(|d| d.signum() / n),
            Loss::Huber { delta } => {
                let delta = *delta;
                diff.mapv(|d| d.clamp(-delta, delta) / n)
            }
        }
    }
}

/// Parameter update rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Optimizer {
    /// Stochastic gradient descent with momentum
    Sgd { learning_rate: f64, momentum: f64 },
    /// Adam
    Adam {
        learning_rate: f64,
        beta1: f64,
        beta2: f64,
        epsilon: f64,
    },
}

impl Optimizer {
    pub fn sgd(learning_rate: f64) -> Self {
        Optimizer::Sgd {
            learning_rate,
            momentum: 0.9,
        }
    }

    pub fn adam(learning_rate: f64) -> Self {
        Optimizer::Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            Optimizer::Sgd { learning_rate, .. } | Optimizer::Adam { learning_rate, .. } => {
                *learning_rate
            }
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::adam(0.001)
    }
}

/// Shape of a training run, reported before the first epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingInfo {
    pub epochs: usize,
    pub train_size: usize,
    pub validation_size: usize,
    pub parameters: usize,
}

/// Result of one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// 1-based epoch number
    pub epoch: usize,
    pub train_loss: f64,
    pub validation_loss: Option<f64>,
    pub elapsed: Duration,
}

/// Per-epoch losses of a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochSummary>,
}

impl TrainingHistory {
    pub fn num_epochs(&self) -> usize {
        self.epochs.len()
    }

    pub fn final_train_loss(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.train_loss)
    }

    pub fn final_validation_loss(&self) -> Option<f64> {
        self.epochs.last().and_then(|e| e.validation_loss)
    }

    pub fn best_validation_loss(&self) -> Option<f64> {
        self.epochs
            .iter()
            .filter_map(|e| e.validation_loss)
            .fold(None, |best, v| Some(best.map_or(v, |b: f64| b.min(v))))
    }
}

/// Hooks into the fit loop
pub trait TrainingListener: Send {
    fn on_training_begin(&mut self, _info: &TrainingInfo) {}

    fn on_epoch(&mut self, _summary: &EpochSummary) {}

    fn on_training_end(&mut self, _history: &TrainingHistory) {}
}

/// Logs losses at info level every `every` epochs and at the last one
#[derive(Debug, Clone)]
pub struct LoggingListener {
    every: usize,
    epochs: usize,
}

impl LoggingListener {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            epochs: 0,
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new(1)
    }
}

impl TrainingListener for LoggingListener {
    fn on_training_begin(&mut self, info: &TrainingInfo) {
        self.epochs = info.epochs;
        info!(
            epochs = info.epochs,
            train_size = info.train_size,
            validation_size = info.validation_size,
            parameters = info.parameters,
            "Training started"
        );
    }

    fn on_epoch(&mut self, summary: &EpochSummary) {
        if summary.epoch % self.every == 0 || summary.epoch == self.epochs {
            info!(
                epoch = summary.epoch,
                train_loss = summary.train_loss,
                validation_loss = ?summary.validation_loss,
                "Epoch finished"
            );
        }
    }
}

/// Tracks wall-clock time of the whole run
#[derive(Debug, Clone, Default)]
pub struct TimingListener {
    started: Option<Instant>,
    total: Option<Duration>,
}

impl TimingListener {
    pub fn total(&self) -> Option<Duration> {
        self.total
    }
}

impl TrainingListener for TimingListener {
    fn on_training_begin(&mut self, _info: &TrainingInfo) {
        self.started = Some(Instant::now());
    }

    fn on_epoch(&mut self, summary: &EpochSummary) {
        debug!(epoch = summary.epoch, elapsed_ms = summary.elapsed.as_millis() as u64, "Epoch timing");
    }

    fn on_training_end(&mut self, history: &TrainingHistory) {
        if let Some(started) = self.started {
            let total = started.elapsed();
            self.total = Some(total);
            info!(
                epochs = history.num_epochs(),
                total_ms = total.as_millis() as u64,
                "Training finished"
            );
        }
    }
}

/// Complete configuration for the trainer
pub struct TrainingPlan {
    pub loss: Loss,
    pub optimizer: Optimizer,
    /// Multiplicative L2 decay applied after each update
    pub weight_decay: f64,
    /// Global gradient-norm ceiling
    pub gradient_clip: Option<f64>,
    pub listeners: Vec<Box<dyn TrainingListener>>,
}

impl TrainingPlan {
    pub fn new(loss: Loss) -> Self {
        Self {
            loss,
            optimizer: Optimizer::default(),
            weight_decay: 0.0,
            gradient_clip: None,
            listeners: Vec::new(),
        }
    }

    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_gradient_clip(mut self, clip: f64) -> Self {
        self.gradient_clip = Some(clip);
        self
    }

    pub fn add_listener(mut self, listener: impl TrainingListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }
}

impl fmt::Debug for TrainingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingPlan")
            .field("loss", &self.loss)
            .field("optimizer", &self.optimizer)
            .field("weight_decay", &self.weight_decay)
            .field("gradient_clip", &self.gradient_clip)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrays() -> (Array2<f64>, Array2<f64>) {
        let p = Array2::from_shape_vec((2, 1), vec![1.0, 3.0]).unwrap();
        let t = Array2::from_shape_vec((2, 1), vec![0.0, 0.0]).unwrap();
        (p, t)
    }

    #[test]
    fn test_loss_values() {
        let (p, t) = arrays();
        assert_eq!(Loss::L2.evaluate(&p, &t), (0.5 + 4.5) / 2.0);
        assert_eq!(Loss::L1.evaluate(&p, &t), 2.0);
        assert_eq!(Loss::Huber { delta: 1.0 }.evaluate(&p, &t), (0.5 + 2.5) / 2.0);
    }

    #[test]
    fn test_loss_gradients() {
        let (p, t) = arrays();
        assert_eq!(Loss::L2.gradient(&p, &t).into_raw_vec_and_offset().0, vec![0.5, 1.5]);
        assert_eq!(Loss::L1.gradient(&p, &t).into_raw_vec_and_offset().0, vec![0.5, 0.5]);
        assert_eq!(
            Loss::Huber { delta: 1.0 }.gradient(&p, &t).into_raw_vec_and_offset().0,
            vec![0.5, 0.5]
        );
    }

    #[test]
    fn test_history_summaries() {
        let epoch = |n, v| EpochSummary {
            epoch: n,
            train_loss: 1.0 / n as f64,
            validation_loss: v,
            elapsed: Duration::from_millis(1),
        };
        let history = TrainingHistory {
            epochs: vec![epoch(1, Some(0.8)), epoch(2, Some(0.5)), epoch(3, Some(0.6))],
        };
        assert_eq!(history.num_epochs(), 3);
        assert_eq!(history.best_validation_loss(), Some(0.5));
        assert_eq!(history.final_validation_loss(), Some(0.6));
        assert!(TrainingHistory::default().final_train_loss().is_none());
    }

    #[test]
    fn test_plan_builder() {
        let plan = TrainingPlan::new(Loss::L1)
            .with_optimizer(Optimizer::sgd(0.01))
            .with_gradient_clip(5.0)
            .add_listener(LoggingListener::default());
        assert_eq!(plan.listeners.len(), 1);
        assert_eq!(plan.optimizer.learning_rate(), 0.01);
        assert!(format!("{:?}", plan).contains("listeners: 1"));
    }
}
