//! CLI subcommands.

pub mod config;
pub mod kill;
pub mod list;
pub mod watch;

use anyhow::{Context, Result};
use portmanager_core::{
    Config, ConfigStore, EngineOptions, KillCommand, LsofScanner, PortManagerEngine, PortService,
};
use tracing::debug;

/// Load the user configuration, falling back to defaults when absent.
pub async fn load_config() -> Result<Config> {
    let store = ConfigStore::new()?;
    debug!(path = %store.path().display(), "Loading configuration");
    store
        .load()
        .await
        .with_context(|| format!("Failed to load {}", store.path().display()))
}

/// Start an engine wired to the real lsof and kill commands.
pub fn start_engine(config: &Config, options: EngineOptions) -> PortManagerEngine {
    PortManagerEngine::start(
        PortService::new(LsofScanner::from_config(config)),
        KillCommand::from_config(config),
        options,
    )
}
