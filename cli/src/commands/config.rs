//! Config command - show the effective configuration.

use anyhow::Result;
use portmanager_core::{ConfigStore, KillCommand, LsofScanner};

use super::load_config;

pub async fn show(json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let config = load_config().await?;
    let scanner = LsofScanner::from_config(&config);
    let killer = KillCommand::from_config(&config);

    if json {
        let value = serde_json::json!({
            "path": store.path(),
            "config": config,
            "lsofProgram": scanner.program(),
            "killProgram": killer.program(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Configuration file: {}", store.path().display());
    if !store.path().exists() {
        println!("  (not found, using defaults)");
    }
    println!();
    println!("lsof:             {}", scanner.program().display());
    println!("kill:             {}", killer.program().display());
    println!("Output format:    {}", config.output_format);
    println!("Command timeout:  {}ms", config.command_timeout_ms);
    println!("Rescan delay:     {}ms", config.rescan_delay_ms);
    println!("Refresh interval: {}s", config.refresh_interval);

    Ok(())
}
