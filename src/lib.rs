pub mod audit;
pub mod cli;
pub mod core;
pub mod manager;
pub mod providers;
pub mod store;

#[cfg(test)]
mod test_support;

use crate::core::config::AppConfig;
use crate::manager::{MarketManager, RefreshSchedule};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Show,
    Watch,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Market feed starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let manager = Arc::new(MarketManager::from_config(&config)?);

    match command {
        AppCommand::Show => cli::show::run(&manager).await,
        AppCommand::Watch => {
            let schedule = RefreshSchedule::from(&config.schedule);
            cli::watch::run(manager, schedule).await
        }
    }
}
