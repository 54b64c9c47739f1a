//! Regressor configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, TabRegError};
use crate::generators::{IdGenerator, NetworkGenerator, OutputDirGenerator, TrainingPlanGenerator};

/// Configuration for a [`TabularRegressor`](crate::TabularRegressor)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressorConfig {
    /// Architecture strategy
    pub network: NetworkGenerator,

    /// Percentage of rows used for training (1..=99); the rest validates
    pub train_percentage: u32,

    pub mini_batch_size: usize,

    pub num_epochs: usize,

    /// Model identity strategy
    pub id: IdGenerator,

    /// Artifact directory strategy
    pub output_dir: OutputDirGenerator,

    pub training_plan: TrainingPlanGenerator,

    /// Append a process-unique suffix to the model name
    pub parallel: bool,

    /// Random seed for the split, batch order and initial weights
    pub seed: Option<u64>,

    /// Shuffle training batches every epoch
    pub shuffle: bool,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            network: NetworkGenerator::default(),
            train_percentage: 80,
            mini_batch_size: 32,
            num_epochs: 20,
            id: IdGenerator::default(),
            output_dir: OutputDirGenerator::default(),
            training_plan: TrainingPlanGenerator::default(),
            parallel: false,
            seed: Some(42),
            shuffle: true,
        }
    }
}

impl RegressorConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(mut self, network: NetworkGenerator) -> Self {
        self.network = network;
        self
    }

    pub fn with_train_percentage(mut self, percentage: u32) -> Self {
        self.train_percentage = percentage;
        self
    }

    pub fn with_mini_batch_size(mut self, size: usize) -> Self {
        self.mini_batch_size = size;
        self
    }

    pub fn with_num_epochs(mut self, epochs: usize) -> Self {
        self.num_epochs = epochs;
        self
    }

    pub fn with_id(mut self, id: IdGenerator) -> Self {
        self.id = id;
        self
    }

    pub fn with_output_dir(mut self, output_dir: OutputDirGenerator) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_training_plan(mut self, plan: TrainingPlanGenerator) -> Self {
        self.training_plan = plan;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=99).contains(&self.train_percentage) {
            return Err(TabRegError::invalid_parameter(
                "train_percentage",
                self.train_percentage,
                "must be between 1 and 99",
            ));
        }
        if self.mini_batch_size == 0 {
            return Err(TabRegError::invalid_parameter("mini_batch_size", 0, "must be positive"));
        }
        if self.num_epochs == 0 {
            return Err(TabRegError::invalid_parameter("num_epochs", 0, "must be positive"));
        }
        Ok(())
    }

    /// Load a JSON config; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::Performance;

    #[test]
    fn test_defaults() {
        let config = RegressorConfig::default();
        assert_eq!(config.train_percentage, 80);
        assert_eq!(config.mini_batch_size, 32);
        assert_eq!(config.num_epochs, 20);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ranges() {
        for pct in [0, 100, 150] {
            let err = RegressorConfig::new().with_train_percentage(pct).validate().unwrap_err();
            assert!(matches!(err, TabRegError::InvalidParameter { .. }));
        }
        assert!(RegressorConfig::new().with_train_percentage(1).validate().is_ok());
        assert!(RegressorConfig::new().with_train_percentage(99).validate().is_ok());
        assert!(RegressorConfig::new().with_mini_batch_size(0).validate().is_err());
        assert!(RegressorConfig::new().with_num_epochs(0).validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = RegressorConfig::new()
            .with_network(NetworkGenerator::tabular(Performance::Fast))
            .with_id(IdGenerator::unique("house"))
            .with_num_epochs(3)
            .with_parallel(true);
        config.save(&path).unwrap();

        let loaded = RegressorConfig::from_file(&path).unwrap();
        assert_eq!(loaded.num_epochs, 3);
        assert_eq!(loaded.id, IdGenerator::unique("house"));
        assert!(loaded.parallel);
        assert_eq!(loaded.network.to_string(), "FAST");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"num_epochs": 5, "network": {"type": "tabular_regression", "performance": "ACCURATE"}}"#)
            .unwrap();
        let loaded = RegressorConfig::from_file(&path).unwrap();
        assert_eq!(loaded.num_epochs, 5);
        assert_eq!(loaded.train_percentage, 80);
        assert_eq!(loaded.network.to_string(), "ACCURATE");
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"train_percentage": 0}"#).unwrap();
        assert!(RegressorConfig::from_file(&path).is_err());
    }
}
