use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TrainingPlanBuilder;
use crate::engine::{LoggingListener, Loss, Optimizer, TimingListener, TrainingPlan};
use crate::error::{Result, TabRegError};

/// Serializable description of a training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSpec {
    pub loss: Loss,
    pub optimizer: Optimizer,
    #[serde(default)]
    pub weight_decay: f64,
    #[serde(default)]
    pub gradient_clip: Option<f64>,
    /// Log every N epochs; 0 disables the logging listener
    #[serde(default = "default_log_every")]
    pub log_every: usize,
}

fn default_log_every() -> usize {
    1
}

impl PlanSpec {
    pub fn new(loss: Loss) -> Self {
        Self {
            loss,
            optimizer: Optimizer::adam(0.01),
            weight_decay: 0.0,
            gradient_clip: None,
            log_every: default_log_every(),
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

    pub fn with_log_every(mut self, every: usize) -> Self {
        self.log_every = every;
        self
    }
}

impl Default for PlanSpec {
    fn default() -> Self {
        Self::new(Loss::L2)
    }
}

impl TrainingPlanBuilder for PlanSpec {
    fn build(&self) -> TrainingPlan {
        let mut plan = TrainingPlan::new(self.loss)
            .with_optimizer(self.optimizer)
            .with_weight_decay(self.weight_decay);
        if let Some(clip) = self.gradient_clip {
            plan = plan.with_gradient_clip(clip);
        }
        if self.log_every > 0 {
            plan = plan.add_listener(LoggingListener::new(self.log_every));
        }
        plan.add_listener(TimingListener::default())
    }
}

/// Training plan strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrainingPlanGenerator {
    /// L2 loss, Adam, logging and timing listeners
    Regression,
    Custom(PlanSpec),
}

impl TrainingPlanGenerator {
    pub fn spec(&self) -> PlanSpec {
        match self {
            TrainingPlanGenerator::Regression => PlanSpec::default(),
            TrainingPlanGenerator::Custom(spec) => spec.clone(),
        }
    }
}

impl Default for TrainingPlanGenerator {
    fn default() -> Self {
        TrainingPlanGenerator::Regression
    }
}

impl TrainingPlanBuilder for TrainingPlanGenerator {
    fn build(&self) -> TrainingPlan {
        self.spec().build()
    }
}

impl fmt::Display for TrainingPlanGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingPlanGenerator::Regression => f.write_str("regression"),
            TrainingPlanGenerator::Custom(spec) => write!(f, "{:?}/{:?}", spec.loss, spec.optimizer),
        }
    }
}

/// `regression`, `l1`, or `huber[:<delta>]`
impl FromStr for TrainingPlanGenerator {
    type Err = TabRegError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.split_once(':').unwrap_or((lower.as_str(), "")) {
            ("regression" | "l2", "") => Ok(TrainingPlanGenerator::Regression),
            ("l1", "") => Ok(TrainingPlanGenerator::Custom(PlanSpec::new(Loss::L1))),
            ("huber", delta) => {
                let delta = if delta.is_empty() {
                    1.0
                } else {
                    delta
                        .parse::<f64>()
                        .map_err(|_| TabRegError::Config(format!("Invalid huber delta: {}", delta)))?
                };
                if delta.is_nan() || delta <= 0.0 {
                    return Err(TabRegError::Config(format!("Huber delta must be positive: {}", delta)));
                }
                Ok(TrainingPlanGenerator::Custom(PlanSpec::new(Loss::Huber { delta })))
            }
            _ => Err(TabRegError::Config(format!("Unknown training plan: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_plan() {
        let plan = TrainingPlanGenerator::Regression.build();
        assert_eq!(plan.loss, Loss::L2);
        assert_eq!(plan.listeners.len(), 2);
    }

    #[test]
    fn test_custom_plan() {
        let spec = PlanSpec::new(Loss::L1)
            .with_optimizer(Optimizer::sgd(0.05))
            .with_gradient_clip(2.0)
            .with_log_every(0);
        let plan = TrainingPlanGenerator::Custom(spec).build();
        assert_eq!(plan.loss, Loss::L1);
        assert_eq!(plan.gradient_clip, Some(2.0));
        assert_eq!(plan.listeners.len(), 1);
    }

    #[test]
    fn test_parse() {
        assert_eq!("L2".parse::<TrainingPlanGenerator>().unwrap(), TrainingPlanGenerator::Regression);
        let huber = "huber:0.5".parse::<TrainingPlanGenerator>().unwrap();
        assert_eq!(huber.spec().loss, Loss::Huber { delta: 0.5 });
        assert!("huber:-1".parse::<TrainingPlanGenerator>().is_err());
        assert!("hinge".parse::<TrainingPlanGenerator>().is_err());
    }
}
