use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clinical_calculators::cli::Cli;
use clinical_calculators::config::ConfigLoader;
use clinical_calculators::engine::Dispatcher;

const DEFAULT_CONFIG_PATH: &str = "config/engine.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => ConfigLoader::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("loading configuration from {}", DEFAULT_CONFIG_PATH))?,
        None => ConfigLoader::default(),
    };
    let config = loader.apply_env()?.into_config();

    init_logging(&config.logging.level);

    let dispatcher = Dispatcher::from_config(&config).context("building calculator registry")?;
    info!(
        calculators = dispatcher.registry().len(),
        version = env!("CARGO_PKG_VERSION"),
        "Clinical calculators ready"
    );

    let code = cli.execute(dispatcher, &config.server).await?;
    std::process::exit(code);
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
