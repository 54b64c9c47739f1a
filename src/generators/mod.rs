//! Pluggable strategies
//!
//! Each concern has a small trait and a closed, serializable enum of the
//! built-in choices. The enums are what [`RegressorConfig`](crate::RegressorConfig)
//! stores; `Custom` variants carry user implementations and are never
//! serialized.

mod identity;
mod network;
mod output_dir;
mod training_plan;

use std::fmt::Debug;
use std::path::PathBuf;

use crate::engine::{NetworkTopology, TrainingPlan};
use crate::error::Result;

pub use identity::{IdGenerator, UniqueIds};
pub use network::{NetworkGenerator, Performance};
pub use output_dir::OutputDirGenerator;
pub use training_plan::{PlanSpec, TrainingPlanGenerator};

/// Produces the base name of a model
pub trait IdentityProvider {
    fn generate(&self) -> String;
}

/// Produces the directory holding a model's artifacts
pub trait LocationProvider {
    fn generate(&self) -> PathBuf;
}

/// Builds a network topology from the adapted dataset's shape
pub trait ArchitectureBuilder: Debug + Send + Sync {
    fn build(&self, feature_count: usize, label_count: usize) -> Result<NetworkTopology>;
}

/// Builds a complete training plan
pub trait TrainingPlanBuilder {
    fn build(&self) -> TrainingPlan;
}
