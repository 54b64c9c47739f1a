//! tabreg - neural-network regression over tabular data
//!
//! Trains a feed-forward network on labeled records, persists it, and serves
//! single-record predictions from the persisted artifacts.
//!
//! # Modules
//!
//! - [`data`] - Attribute-typed records, capability checks, CSV loading
//! - [`dataset`] - Adaptation of records into dense features and splits
//! - [`engine`] - Networks, training plans, the fit loop, parameter files
//! - [`generators`] - Identity, location, architecture and training-plan strategies
//! - [`registry`] - Name-keyed registry of live model handles
//! - [`regressor`] - The lifecycle orchestrator
//! - [`cli`] - Command-line interface
//!
//! ```no_run
//! use tabreg::prelude::*;
//!
//! # fn main() -> tabreg::error::Result<()> {
//! let data = DataLoader::new().load_csv("houses.csv", Some("price"))?;
//! let config = RegressorConfig::new()
//!     .with_network(NetworkGenerator::tabular(Performance::Fast))
//!     .with_output_dir(OutputDirGenerator::fixed("models"));
//!
//! let mut regressor = TabularRegressor::new(config, ModelRegistry::shared());
//! regressor.train(&data)?;
//! let price = regressor.predict(&data.record(0).unwrap())?;
//! # Ok(())
//! # }
//! ```

pub mod error;

pub mod config;
pub mod data;
pub mod dataset;
pub mod engine;
pub mod generators;
pub mod registry;
pub mod regressor;

pub mod cli;

pub use config::RegressorConfig;
pub use error::{Result, TabRegError};
pub use registry::ModelRegistry;
pub use regressor::{
    CleanupWarning, LifecycleState, RegressorSnapshot, TabularRegressor, TrainingReport,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::RegressorConfig;
    pub use crate::data::{Attribute, Capabilities, DataLoader, Instances, Record, Schema, Value};
    pub use crate::dataset::{AdaptationDescriptor, ListFeatures, TabularDataset};
    pub use crate::error::{Result, TabRegError};
    pub use crate::generators::{
        IdGenerator, NetworkGenerator, OutputDirGenerator, Performance, TrainingPlanGenerator,
    };
    pub use crate::registry::ModelRegistry;
    pub use crate::regressor::{LifecycleState, TabularRegressor, TrainingReport};
}
