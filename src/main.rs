//! tabreg - train and serve tabular regression networks

use clap::Parser;
use tabreg::cli::{cmd_info, cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabreg=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => cmd_train(&args)?,
        Commands::Predict { model_dir, name, data, output } => {
            cmd_predict(&model_dir, &name, &data, output.as_deref())?;
        }
        Commands::Info { data, target } => cmd_info(&data, target.as_deref())?,
    }

    Ok(())
}
