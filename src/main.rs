#![allow(non_snake_case)]

use std::env;

use anyhow::anyhow;
use tracing::info;

use dayPlanner::cli;
use dayPlanner::config::{AppConfig, RunMode, Settings};
use dayPlanner::logging;
use dayPlanner::runtime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path)
            .map_err(|e| anyhow!("Unable to read config file {}: {}", path, e))?,
        Err(_) => AppConfig::default(),
    };
    let settings = Settings::resolve(&config).map_err(|e| anyhow!(e))?;
    logging::init_logging(&settings.log_level);

    match settings.run_mode {
        RunMode::Api => {
            info!("Starting in api mode");
            runtime::run_api(settings).await
        }
        RunMode::Cli => cli::cli(settings).await,
    }
}
