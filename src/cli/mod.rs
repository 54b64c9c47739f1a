//! tabreg CLI Module
//!
//! Command-line interface for training, prediction, and dataset inspection.

use clap::{Args, Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::RegressorConfig;
use crate::data::{relation_name, AttributeKind, Capabilities, Capability, DataLoader};
use crate::generators::{IdGenerator, NetworkGenerator, OutputDirGenerator, TrainingPlanGenerator};
use crate::registry::ModelRegistry;
use crate::regressor::TabularRegressor;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {} ", dim("·"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabreg")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and serve neural-network regressors on tabular data")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model and persist it
    Train(TrainArgs),

    /// Predict every row of a CSV file with a persisted model
    Predict {
        /// Directory holding the model artifacts
        #[arg(short, long)]
        model_dir: PathBuf,

        /// Resolved model name
        #[arg(short, long)]
        name: String,

        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV file (input columns plus `prediction`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show dataset schema and whether it can be trained on
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Label column
        #[arg(short, long)]
        target: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Training CSV file
    #[arg(short, long)]
    pub data: PathBuf,

    /// Label column
    #[arg(short, long)]
    pub target: String,

    /// JSON config file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// FAST, BALANCED, ACCURATE or layers:<w1>,<w2>[:<activation>]
    #[arg(long)]
    pub network: Option<NetworkGenerator>,

    /// regression, l1 or huber[:<delta>]
    #[arg(long)]
    pub plan: Option<TrainingPlanGenerator>,

    #[arg(long)]
    pub train_percentage: Option<u32>,

    #[arg(long)]
    pub mini_batch_size: Option<usize>,

    #[arg(long)]
    pub num_epochs: Option<usize>,

    /// fixed:<id>, unique:<prefix> or a bare id
    #[arg(long)]
    pub id: Option<IdGenerator>,

    /// Directory or temp:<subdir>
    #[arg(short, long)]
    pub output_dir: Option<OutputDirGenerator>,

    /// Append a process-unique suffix to the model name
    #[arg(long)]
    pub parallel: bool,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Accept nominal feature columns (one-hot encoded)
    #[arg(long)]
    pub allow_nominal: bool,
}

impl TrainArgs {
    /// Config file (or defaults) with command-line overrides applied
    pub fn to_config(&self) -> anyhow::Result<RegressorConfig> {
        let mut config = match &self.config {
            Some(path) => RegressorConfig::from_file(path)?,
            None => RegressorConfig::default(),
        };
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        if let Some(plan) = &self.plan {
            config.training_plan = plan.clone();
        }
        if let Some(pct) = self.train_percentage {
            config.train_percentage = pct;
        }
        if let Some(size) = self.mini_batch_size {
            config.mini_batch_size = size;
        }
        if let Some(epochs) = self.num_epochs {
            config.num_epochs = epochs;
        }
        if let Some(id) = &self.id {
            config.id = id.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    section("Train");
    let config = args.to_config()?;

    step_run("Loading data");
    let start = Instant::now();
    let data = DataLoader::new().load_csv(&args.data, Some(args.target.as_str()))?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        data.num_instances(),
        data.schema().num_attributes(),
        start.elapsed()
    ));

    let mut capabilities = Capabilities::regression();
    if args.allow_nominal {
        capabilities = capabilities.enable(Capability::NominalAttributes);
    }
    let mut regressor =
        TabularRegressor::new(config, ModelRegistry::shared()).with_capabilities(capabilities);

    step_run(&format!("Training {}", regressor.config().network.to_string().cyan()));
    let start = Instant::now();
    let report = regressor.train(&data)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    kv("Model", &report.model_name);
    kv("Directory", &report.model_dir.display().to_string());
    kv("Network", &report.topology.to_string());
    kv("Rows", &format!("{} train / {} validation", report.train_size, report.validation_size));
    if let Some(loss) = report.history.final_train_loss() {
        kv("Train loss", &format!("{:.6}", loss));
    }
    if let Some(loss) = report.history.final_validation_loss() {
        kv("Validation loss", &format!("{:.6}", loss));
    }
    if !report.removed_files.is_empty() {
        kv("Stale removed", &report.removed_files.len().to_string());
    }
    for warning in &report.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
    println!();

    regressor.close();
    Ok(())
}

pub fn cmd_predict(
    model_dir: &Path,
    name: &str,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    let mut regressor = TabularRegressor::open(model_dir, name, ModelRegistry::shared())?;

    step_run("Loading data");
    let loader = DataLoader::new();
    let mut df = loader.read_frame(data_path)?;
    let data = DataLoader::from_dataframe(&df, &relation_name(data_path), None)?;
    step_done(&format!("{} rows", data.num_instances()));

    step_run("Predicting");
    let start = Instant::now();
    let predictions = regressor.predict_instances(&data)?;
    step_done(&format!("{:?}", start.elapsed()));

    match output {
        Some(path) => {
            df.with_column(Series::new("prediction".into(), predictions))?;
            let mut file = File::create(path)?;
            CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
            kv("Written", &path.display().to_string());
        }
        None => {
            println!();
            for (row, value) in predictions.iter().enumerate().take(20) {
                println!("  {:>6}  {}", muted(&row.to_string()), format!("{:.6}", value).white());
            }
            if predictions.len() > 20 {
                println!("  {}", dim(&format!("... {} more", predictions.len() - 20)));
            }
        }
    }
    println!();

    regressor.close();
    Ok(())
}

pub fn cmd_info(data_path: &Path, target: Option<&str>) -> anyhow::Result<()> {
    section("Dataset");

    let data = DataLoader::new().load_csv(data_path, target)?;
    let schema = data.schema();
    kv("Relation", &schema.relation);
    kv("Rows", &data.num_instances().to_string());
    println!();

    for (index, attribute) in schema.attributes().iter().enumerate() {
        let kind = match &attribute.kind {
            AttributeKind::Nominal(values) => format!("nominal ({} values)", values.len()),
            other => other.to_string(),
        };
        let marker = if schema.class_index() == Some(index) { " (label)" } else { "" };
        println!("  {:<24} {}{}", attribute.name.white(), muted(&kind), ok(marker));
    }

    if target.is_some() {
        println!();
        match Capabilities::regression().test(&data) {
            Ok(()) => println!("  {} {}", ok("✓"), "Trainable as-is"),
            Err(e) => println!("  {} {}", "✗".red(), e),
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::Performance;

    #[test]
    fn test_train_args_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        RegressorConfig::new().with_num_epochs(7).with_mini_batch_size(16).save(&path).unwrap();

        let cli = Cli::try_parse_from([
            "tabreg", "train", "--data", "d.csv", "--target", "y",
            "--config", path.to_str().unwrap(),
            "--network", "ACCURATE", "--mini-batch-size", "4", "--id", "unique:run", "--parallel",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train command");
        };

        let config = args.to_config().unwrap();
        assert_eq!(config.num_epochs, 7);
        assert_eq!(config.mini_batch_size, 4);
        assert_eq!(config.network.to_string(), Performance::Accurate.to_string());
        assert_eq!(config.id, IdGenerator::unique("run"));
        assert!(config.parallel);
    }

    #[test]
    fn test_unknown_preset_rejected_by_parser() {
        let result = Cli::try_parse_from([
            "tabreg", "train", "--data", "d.csv", "--target", "y", "--network", "HUGE",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_override_rejected() {
        let cli = Cli::try_parse_from([
            "tabreg", "train", "-d", "d.csv", "-t", "y", "--train-percentage", "100",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train command");
        };
        assert!(args.to_config().is_err());
    }
}
