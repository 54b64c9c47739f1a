//! Model lifecycle orchestration
//!
//! [`TabularRegressor`] drives a model from a labeled dataset to persisted
//! artifacts, and from persisted artifacts plus one unlabeled record to a
//! prediction.
//!
//! ```text
//! Unbuilt --train--> Training --> Trained --predict--> Serving
//!                       |
//!                       +--(error)--> Unbuilt
//! open/from_snapshot --> Loaded --predict--> Serving
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RegressorConfig;
use crate::data::{Capabilities, Instances, Record};
use crate::dataset::{AdaptationDescriptor, FeatureTranslator, ListFeatures, Partition, TabularDataset};
use crate::engine::{
    persist, ModelHandle, Network, NetworkTopology, Predictor, Trainer, TrainingHistory,
};
use crate::error::{Result, TabRegError};
use crate::generators::{
    ArchitectureBuilder, IdentityProvider, LocationProvider, NetworkGenerator, TrainingPlanBuilder,
    UniqueIds,
};
use crate::registry::ModelRegistry;

/// Extension of the snapshot written next to the parameter files
pub const SNAPSHOT_EXTENSION: &str = "json";

/// Where a regressor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Nothing trained or loaded
    Unbuilt,
    /// Inside `train`
    Training,
    /// Trained in this process, predictor not yet created
    Trained,
    /// Built from persisted artifacts, weights loaded on first prediction
    Loaded,
    /// Predictor ready
    Serving,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Unbuilt => "UNBUILT",
            LifecycleState::Training => "TRAINING",
            LifecycleState::Trained => "TRAINED",
            LifecycleState::Loaded => "LOADED",
            LifecycleState::Serving => "SERVING",
        };
        f.write_str(name)
    }
}

/// A stale artifact that could not be removed. Training carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to remove {}: {}", self.path.display(), self.reason)
    }
}

/// Outcome of a successful `train` call
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model_name: String,
    pub model_dir: PathBuf,
    pub params_path: PathBuf,
    pub topology: NetworkTopology,
    pub train_size: usize,
    pub validation_size: usize,
    pub history: TrainingHistory,
    /// Stale artifacts deleted before training
    pub removed_files: Vec<PathBuf>,
    pub warnings: Vec<CleanupWarning>,
}

/// Everything needed to serve a trained model without its training rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressorSnapshot {
    pub config: RegressorConfig,
    pub model_name: String,
    pub model_dir: PathBuf,
    /// Zero-row copy of the training data
    pub header: Instances,
    pub descriptor: AdaptationDescriptor,
    pub trained_at: DateTime<Utc>,
}

impl RegressorSnapshot {
    pub fn file_name(model_name: &str) -> String {
        format!("{}.{}", model_name, SNAPSHOT_EXTENSION)
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(Self::file_name(&self.model_name));
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn load(dir: &Path, model_name: &str) -> Result<Self> {
        let path = dir.join(Self::file_name(model_name));
        if !path.is_file() {
            return Err(TabRegError::ArtifactNotFound(path.display().to_string()));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Neural-network regressor over tabular data
pub struct TabularRegressor {
    config: RegressorConfig,
    registry: Arc<ModelRegistry>,
    capabilities: Capabilities,
    state: LifecycleState,
    model_name: Option<String>,
    model_dir: Option<PathBuf>,
    header: Option<Instances>,
    descriptor: Option<AdaptationDescriptor>,
    trained_at: Option<DateTime<Utc>>,
    handle: Option<Arc<ModelHandle>>,
    predictor: Option<Predictor>,
}

impl TabularRegressor {
    /// Create a new unbuilt regressor sharing `registry`
    pub fn new(config: RegressorConfig, registry: Arc<ModelRegistry>) -> Self {
        Self {
            config,
            registry,
            capabilities: Capabilities::regression(),
            state: LifecycleState::Unbuilt,
            model_name: None,
            model_dir: None,
            header: None,
            descriptor: None,
            trained_at: None,
            handle: None,
            predictor: None,
        }
    }

    /// Override the accepted dataset shapes, e.g. to allow nominal features
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Rebuild a regressor from a snapshot; weights load on first prediction
    pub fn from_snapshot(snapshot: RegressorSnapshot, registry: Arc<ModelRegistry>) -> Result<Self> {
        snapshot.descriptor.check_schema(snapshot.header.schema())?;
        let mut regressor = Self::new(snapshot.config, registry);
        regressor.state = LifecycleState::Loaded;
        regressor.model_name = Some(snapshot.model_name);
        regressor.model_dir = Some(snapshot.model_dir);
        regressor.header = Some(snapshot.header);
        regressor.descriptor = Some(snapshot.descriptor);
        regressor.trained_at = Some(snapshot.trained_at);
        Ok(regressor)
    }

    /// Open the model `name` persisted in `dir`
    pub fn open(dir: impl AsRef<Path>, name: &str, registry: Arc<ModelRegistry>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut snapshot = RegressorSnapshot::load(dir, name)?;
        snapshot.model_dir = dir.to_path_buf();
        Self::from_snapshot(snapshot, registry)
    }

    pub fn config(&self) -> &RegressorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Resolved model name, parallel suffix included
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn model_dir(&self) -> Option<&Path> {
        self.model_dir.as_deref()
    }

    pub fn descriptor(&self) -> Option<&AdaptationDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn handle(&self) -> Option<&Arc<ModelHandle>> {
        self.handle.as_ref()
    }

    /// Train on `data`, replacing any model this regressor held
    pub fn train(&mut self, data: &Instances) -> Result<TrainingReport> {
        self.capabilities.test(data)?;
        self.config.validate()?;

        let mut name = self.config.id.generate();
        if self.config.parallel {
            name = format!("{}-{}", name, UniqueIds::next());
        }
        let dir = self.config.output_dir.generate();
        info!(model = %name, dir = %dir.display(), rows = data.num_instances(), "Training model");

        self.close();
        self.state = LifecycleState::Training;
        self.model_name = Some(name.clone());
        self.model_dir = Some(dir.clone());

        match self.run_training(data, &name, &dir) {
            Ok(report) => {
                self.state = LifecycleState::Trained;
                Ok(report)
            }
            Err(e) => {
                warn!(model = %name, error = %e, "Training failed");
                self.state = LifecycleState::Unbuilt;
                self.descriptor = None;
                self.header = None;
                Err(e)
            }
        }
    }

    fn run_training(&mut self, data: &Instances, name: &str, dir: &Path) -> Result<TrainingReport> {
        fs::create_dir_all(dir)?;
        let (removed_files, warnings) = remove_stale_artifacts(dir, name);

        let dataset = TabularDataset::builder()
            .sampling(self.config.mini_batch_size, self.config.shuffle)
            .data(data)
            .add_all_features()
            .build()?;
        self.descriptor = Some(dataset.descriptor().clone());
        self.header = Some(data.header());

        let (train, validation) = dataset.random_split(self.config.train_percentage, self.config.seed)?;

        let handle = Arc::new(ModelHandle::reserve(name));
        if let Some(evicted) = self.registry.install(Arc::clone(&handle)) {
            info!(model = %name, evicted = evicted.serial(), "Released previous model under the same name");
        }
        self.handle = Some(Arc::clone(&handle));

        let (network, history) = self.fit(&dataset, &train, &validation)?;
        let topology = network.topology().clone();
        handle.attach(network)?;

        let params_path = handle.with_network(|network| {
            persist::save_params(dir, name, self.config.num_epochs, network)
        })??;
        let trained_at = Utc::now();
        self.trained_at = Some(trained_at);
        self.snapshot()?.save(dir)?;
        info!(model = %name, path = %params_path.display(), "Model saved");

        Ok(TrainingReport {
            model_name: name.to_string(),
            model_dir: dir.to_path_buf(),
            params_path,
            topology,
            train_size: train.len(),
            validation_size: validation.len(),
            history,
            removed_files,
            warnings,
        })
    }

    fn fit(
        &self,
        dataset: &TabularDataset,
        train: &Partition,
        validation: &Partition,
    ) -> Result<(Network, TrainingHistory)> {
        let topology = self.config.network.build(dataset.feature_size(), dataset.label_size())?;
        debug!(topology = %topology, "Built network");
        let plan = self.config.training_plan.build();
        let seed = self.config.seed;

        let mut network = Network::new(topology, seed)?;
        let mut trainer = Trainer::new(plan, seed.map(|s| s.wrapping_add(1)));
        let history = trainer.fit(&mut network, self.config.num_epochs, dataset, train, validation)?;
        Ok((network, history))
    }

    /// Predict the label of one record.
    ///
    /// The record is encoded before any lazy loading, so an encoding error
    /// leaves the regressor untouched.
    pub fn predict(&mut self, record: &Record<'_>) -> Result<f64> {
        let descriptor = self.descriptor.as_ref().ok_or(TabRegError::ModelNotBuilt)?;
        let features = ListFeatures::from_record(record, descriptor)?;
        self.predict_features(&features)
    }

    /// Predict from feature values already in descriptor order
    pub fn predict_features(&mut self, features: &ListFeatures) -> Result<f64> {
        self.ensure_serving()?;
        let predictor = self.predictor.as_ref().ok_or(TabRegError::ModelNotBuilt)?;
        predictor.predict(features)
    }

    /// Predict every row of `data`
    pub fn predict_instances(&mut self, data: &Instances) -> Result<Vec<f64>> {
        data.records().map(|record| self.predict(&record)).collect()
    }

    fn ensure_serving(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::Unbuilt | LifecycleState::Training => return Err(TabRegError::ModelNotBuilt),
            LifecycleState::Serving if self.predictor.as_ref().map_or(false, Predictor::is_valid) => {
                return Ok(())
            }
            _ => {}
        }

        let handle = match self.handle.clone() {
            Some(handle) => handle,
            None => self.load()?,
        };
        let descriptor = self.descriptor.as_ref().ok_or(TabRegError::ModelNotBuilt)?;
        debug!(model = %handle.name(), "Instantiating predictor");
        self.predictor = Some(Predictor::new(handle, FeatureTranslator::new(descriptor))?);
        self.state = LifecycleState::Serving;
        Ok(())
    }

    fn load(&mut self) -> Result<Arc<ModelHandle>> {
        let (name, dir, header, descriptor) = match (
            &self.model_name,
            &self.model_dir,
            &self.header,
            &self.descriptor,
        ) {
            (Some(name), Some(dir), Some(header), Some(descriptor)) => (name, dir, header, descriptor),
            _ => return Err(TabRegError::ModelNotBuilt),
        };
        debug!(model = %name, dir = %dir.display(), "Loading model");

        let dataset = TabularDataset::reconstruct(header, descriptor.clone())?;
        let expected = self.config.network.build(dataset.feature_size(), dataset.label_size())?;
        let (network, epoch) = persist::load_params(dir, name)?;
        if network.topology() != &expected {
            return Err(TabRegError::Reconstruction(format!(
                "Persisted network {} does not match rebuilt architecture {}",
                network.topology(),
                expected
            )));
        }

        let handle = Arc::new(ModelHandle::loaded(name.clone(), network));
        self.registry.install(Arc::clone(&handle));
        info!(model = %name, epoch, "Model loaded");
        self.handle = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Serializable state of a trained or loaded model
    pub fn snapshot(&self) -> Result<RegressorSnapshot> {
        let (Some(model_name), Some(model_dir), Some(header), Some(descriptor)) = (
            &self.model_name,
            &self.model_dir,
            &self.header,
            &self.descriptor,
        ) else {
            return Err(TabRegError::ModelNotBuilt);
        };

        let mut config = self.config.clone();
        if config.network.is_custom() {
            let topology = self
                .handle
                .as_ref()
                .ok_or(TabRegError::ModelNotBuilt)?
                .with_network(|n| n.topology().clone())?;
            config.network = NetworkGenerator::Layers {
                hidden: topology.hidden_layers,
                activation: topology.activation,
            };
        }

        Ok(RegressorSnapshot {
            config,
            model_name: model_name.clone(),
            model_dir: model_dir.clone(),
            header: header.clone(),
            descriptor: descriptor.clone(),
            trained_at: self.trained_at.unwrap_or_else(Utc::now),
        })
    }

    /// Release the engine handle. Safe to call any number of times.
    ///
    /// A closed regressor that knows its artifacts reloads them on the next
    /// prediction. A regressor whose handle was evicted by another one no
    /// longer owns the files under its name and goes back to `Unbuilt`.
    pub fn close(&mut self) {
        self.predictor = None;
        let mut evicted = false;
        if let Some(handle) = self.handle.take() {
            let removed = self.registry.remove(&handle);
            evicted = !removed && handle.is_released();
            if handle.release() {
                debug!(model = %handle.name(), "Released model handle");
            }
        }
        if evicted {
            debug!(model = ?self.model_name, "Model was evicted, forgetting its artifacts");
            self.state = LifecycleState::Unbuilt;
            self.model_name = None;
            self.model_dir = None;
            self.header = None;
            self.descriptor = None;
            self.trained_at = None;
        } else if matches!(self.state, LifecycleState::Trained | LifecycleState::Serving) {
            self.state = LifecycleState::Loaded;
        }
    }
}

/// Delete parameter files and the snapshot left by an earlier run of `name`.
///
/// Best effort: anything that cannot be listed or removed becomes a warning.
fn remove_stale_artifacts(dir: &Path, name: &str) -> (Vec<PathBuf>, Vec<CleanupWarning>) {
    let mut removed = Vec::new();
    let mut warnings = Vec::new();

    let mut stale: Vec<PathBuf> = match persist::list_params(dir, name) {
        Ok(found) => found.into_iter().map(|(_, path)| path).collect(),
        Err(e) => {
            let warning = CleanupWarning {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            };
            warn!("{}", warning);
            warnings.push(warning);
            Vec::new()
        }
    };
    let snapshot = dir.join(RegressorSnapshot::file_name(name));
    if snapshot.is_file() {
        stale.push(snapshot);
    }

    for path in stale {
        debug!(path = %path.display(), "Removing stale artifact");
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) => {
                let warning = CleanupWarning {
                    path,
                    reason: e.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }
    (removed, warnings)
}

impl fmt::Display for TabularRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TabularRegressor [{}]", self.state)?;
        writeln!(f, "  network:          {}", self.config.network)?;
        writeln!(f, "  training plan:    {}", self.config.training_plan)?;
        writeln!(f, "  train percentage: {}", self.config.train_percentage)?;
        writeln!(f, "  mini-batch size:  {}", self.config.mini_batch_size)?;
        writeln!(f, "  epochs:           {}", self.config.num_epochs)?;
        writeln!(f, "  id:               {}", self.config.id)?;
        writeln!(f, "  output dir:       {}", self.config.output_dir)?;
        write!(f, "  parallel:         {}", self.config.parallel)?;
        if let (Some(name), Some(dir)) = (&self.model_name, &self.model_dir) {
            write!(f, "\n  model:            {} in {}", name, dir.display())?;
        }
        if let Some(descriptor) = &self.descriptor {
            write!(
                f,
                "\n  features:         {} -> {}",
                descriptor.feature_names().join(", "),
                descriptor.label.name
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for TabularRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabularRegressor")
            .field("state", &self.state)
            .field("model_name", &self.model_name)
            .field("model_dir", &self.model_dir)
            .field("handle", &self.handle)
            .finish()
    }
}

impl Drop for TabularRegressor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Attribute, Schema, Value};
    use crate::generators::{IdGenerator, OutputDirGenerator, Performance};

    fn data(n: usize) -> Instances {
        let schema = Schema::new(
            "lin",
            vec![Attribute::numeric("x1"), Attribute::numeric("x2"), Attribute::numeric("y")],
        )
        .with_class("y")
        .unwrap();
        let rows = (0..n)
            .map(|i| {
                let x1 = i as f64 / n as f64;
                let x2 = ((i * 3) % 7) as f64;
                vec![x1.into(), x2.into(), (3.0 * x1 - 0.5 * x2).into()]
            })
            .collect();
        Instances::new(schema).with_rows(rows).unwrap()
    }

    fn config(dir: &Path) -> RegressorConfig {
        RegressorConfig::new()
            .with_network(NetworkGenerator::tabular(Performance::Fast))
            .with_id(IdGenerator::fixed("unit"))
            .with_output_dir(OutputDirGenerator::fixed(dir))
            .with_mini_batch_size(8)
            .with_num_epochs(2)
    }

    #[test]
    fn test_state_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut regressor = TabularRegressor::new(config(dir.path()), ModelRegistry::shared());
        assert_eq!(regressor.state(), LifecycleState::Unbuilt);

        let train = data(40);
        regressor.train(&train).unwrap();
        assert_eq!(regressor.state(), LifecycleState::Trained);

        regressor.predict(&train.record(0).unwrap()).unwrap();
        assert_eq!(regressor.state(), LifecycleState::Serving);

        regressor.close();
        assert_eq!(regressor.state(), LifecycleState::Loaded);
        regressor.close();
        assert!(regressor.handle().is_none());

        // reloads from disk
        regressor.predict(&train.record(1).unwrap()).unwrap();
        assert_eq!(regressor.state(), LifecycleState::Serving);
    }

    #[test]
    fn test_predict_before_train() {
        let dir = tempfile::tempdir().unwrap();
        let mut regressor = TabularRegressor::new(config(dir.path()), ModelRegistry::shared());
        let train = data(5);
        let err = regressor.predict(&train.record(0).unwrap()).unwrap_err();
        assert!(matches!(err, TabRegError::ModelNotBuilt));
    }

    #[test]
    fn test_stale_artifacts_removed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("unit-0007.params"), b"stale").unwrap();
        fs::write(dir.path().join("unit-other-0007.params"), b"keep").unwrap();
        fs::write(dir.path().join("unit.json"), b"{}").unwrap();

        let mut regressor = TabularRegressor::new(config(dir.path()), ModelRegistry::shared());
        let report = regressor.train(&data(30)).unwrap();

        assert_eq!(report.removed_files.len(), 2);
        assert!(report.warnings.is_empty());
        assert!(!dir.path().join("unit-0007.params").exists());
        assert!(dir.path().join("unit-other-0007.params").exists());
        assert!(dir.path().join("unit-0002.params").exists());
        assert!(dir.path().join("unit.json").exists());
    }

    #[test]
    fn test_undeletable_artifact_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("unit-0003.params")).unwrap();

        let mut regressor = TabularRegressor::new(config(dir.path()), ModelRegistry::shared());
        let train = data(30);
        let report = regressor.train(&train).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, dir.path().join("unit-0003.params"));
        assert!(report.removed_files.is_empty());
        assert!(dir.path().join("unit-0002.params").is_file());
        assert_eq!(regressor.state(), LifecycleState::Trained);

        regressor.close();
        assert!(regressor.predict(&train.record(0).unwrap()).unwrap().is_finite());
    }

    #[test]
    fn test_unlistable_dir_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        let (removed, warnings) = remove_stale_artifacts(&file, "unit");
        assert!(removed.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, file);
    }

    #[test]
    fn test_evicted_regressor_does_not_reload_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::shared();
        let train = data(30);

        let mut first = TabularRegressor::new(config(dir.path()), Arc::clone(&registry));
        first.train(&train).unwrap();
        let mut second = TabularRegressor::new(config(dir.path()), Arc::clone(&registry));
        second.train(&train).unwrap();
        second.predict(&train.record(0).unwrap()).unwrap();
        let live = registry.get("unit").unwrap();

        first.close();
        assert_eq!(first.state(), LifecycleState::Unbuilt);
        let err = first.predict(&train.record(0).unwrap()).unwrap_err();
        assert!(matches!(err, TabRegError::ModelNotBuilt));

        assert!(!live.is_released());
        assert!(Arc::ptr_eq(&registry.get("unit").unwrap(), &live));
        assert!(second.predict(&train.record(1).unwrap()).unwrap().is_finite());
    }

    #[test]
    fn test_invalid_config_fails_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never");
        let mut regressor = TabularRegressor::new(
            config(&out).with_train_percentage(100),
            ModelRegistry::shared(),
        );
        assert!(regressor.train(&data(20)).is_err());
        assert!(!out.exists());
        assert_eq!(regressor.state(), LifecycleState::Unbuilt);
    }

    #[test]
    fn test_missing_value_at_predict_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut regressor = TabularRegressor::new(config(dir.path()), ModelRegistry::shared());
        let train = data(30);
        regressor.train(&train).unwrap();

        let values = vec![Value::Missing, Value::Numeric(1.0), Value::Missing];
        let record = Record::new(train.schema(), &values).unwrap();
        assert!(regressor.predict(&record).unwrap().is_finite());
    }

    #[test]
    fn test_display_mentions_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut regressor = TabularRegressor::new(config(dir.path()), ModelRegistry::shared());
        assert!(regressor.to_string().contains("UNBUILT"));
        regressor.train(&data(20)).unwrap();
        let text = regressor.to_string();
        assert!(text.contains("FAST"));
        assert!(text.contains("x1, x2 -> y"));
    }

    #[derive(Debug)]
    struct Wide;

    impl ArchitectureBuilder for Wide {
        fn build(&self, feature_count: usize, label_count: usize) -> Result<NetworkTopology> {
            Ok(NetworkTopology::new(feature_count, label_count, vec![12]))
        }
    }

    #[test]
    fn test_custom_architecture_snapshot_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::shared();
        let train = data(30);
        let mut regressor = TabularRegressor::new(
            config(dir.path()).with_network(NetworkGenerator::custom(Wide)),
            Arc::clone(&registry),
        );
        regressor.train(&train).unwrap();
        let expected = regressor.predict(&train.record(3).unwrap()).unwrap();
        drop(regressor);

        let mut reopened = TabularRegressor::open(dir.path(), "unit", registry).unwrap();
        let actual = reopened.predict(&train.record(3).unwrap()).unwrap();
        assert!((expected - actual).abs() < 1e-12);
    }
}
