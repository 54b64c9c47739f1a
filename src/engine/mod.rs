//! Numeric engine
//!
//! Dense feed-forward networks over `ndarray`:
//! - [`NetworkTopology`] describes an architecture
//! - [`Trainer`] runs a [`TrainingPlan`] over dataset partitions
//! - [`persist`] stores and loads parameter files
//! - [`ModelHandle`] and [`Predictor`] serve trained networks

mod handle;
mod network;
mod plan;
mod predictor;
mod topology;
mod trainer;
pub mod persist;

pub use handle::ModelHandle;
pub use network::{Network, NetworkParams};
pub use plan::{
    EpochSummary, LoggingListener, Loss, Optimizer, TimingListener, TrainingHistory,
    TrainingInfo, TrainingListener, TrainingPlan,
};
pub use predictor::Predictor;
pub use topology::{Activation, NetworkTopology};
pub use trainer::Trainer;
