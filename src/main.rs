use anyhow::Context;
use clap::Parser;
use healthy_plate::cli::{self, Cli, Commands};
use healthy_plate::config::AppConfig;
use healthy_plate::ml::ModelArtifact;
use healthy_plate::services::{Advisor, AppState, Metrics, PlateServer};
use std::sync::Arc;
use tracing::{error, info};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config).context("Failed to load configuration")?;
    if let Some(model) = &cli.model {
        config.model.path = model.clone();
    }

    match &cli.command {
        Some(Commands::Predict(args)) => {
            init_logging_simple();
            let advisor = load_advisor(&config)?;
            cli::predict_once(&advisor, args);
        }
        Some(Commands::Examples) => {
            init_logging_simple();
            let advisor = load_advisor(&config)?;
            cli::run_examples(&advisor, &config.form);
        }
        Some(Commands::Schema) => {
            init_logging_simple();
            let artifact = ModelArtifact::load(&config.model.path)?;
            cli::show_schema(&artifact)?;
        }
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = *port;
            }
            run_server(config).await?;
        }
        None => run_server(config).await?,
    }

    Ok(())
}

/// Load the artifact and check its schema. Either failing is fatal.
fn load_advisor(config: &AppConfig) -> anyhow::Result<Advisor> {
    let artifact = ModelArtifact::load(&config.model.path)
        .with_context(|| format!("Failed to load model {}", config.model.path.display()))?;
    let advisor = Advisor::new(artifact).context("Model schema does not match the nutrition form")?;
    Ok(advisor)
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Config error: {}", e);
        }
        anyhow::bail!("Invalid configuration ({} error(s))", errors.len());
    }

    let metrics = Arc::new(Metrics::new());
    let advisor = match load_advisor(&config) {
        Ok(advisor) => advisor.with_metrics(metrics.clone()),
        Err(e) => {
            error!("Refusing to serve: {:#}", e);
            return Err(e);
        }
    };
    info!(
        "Model ready: {} (features: {:?})",
        advisor.oracle().describe(),
        advisor.assembler().order()
    );

    let state = AppState::new(Arc::new(advisor), metrics, config.form.clone());
    PlateServer::new(state, config.bind_address()).run().await?;

    info!("Shutdown complete");
    Ok(())
}
