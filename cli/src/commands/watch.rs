//! Watch command - print the port list on every timer-triggered scan.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use portmanager_core::EngineOptions;

use super::list::print_table;
use super::{load_config, start_engine};

pub async fn run(interval: Option<u64>, json: bool) -> Result<()> {
    let config = load_config().await?;
    let period = match interval {
        Some(0) => bail!("--interval must be greater than zero"),
        Some(secs) => Duration::from_secs(secs),
        None => config.refresh_period(),
    };

    let options = EngineOptions::from_config(&config).with_refresh_interval(period);
    let engine = start_engine(&config, options);
    let mut updates = engine.subscribe();
    let mut printed_scans = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    engine.scan();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                changed.context("Engine stopped unexpectedly")?;
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.completed_scans == printed_scans {
                    continue;
                }
                printed_scans = snapshot.completed_scans;

                if json {
                    let line = serde_json::json!({
                        "timestamp": Local::now().to_rfc3339(),
                        "ports": snapshot.ports.as_ref(),
                        "error": snapshot.error_message,
                    });
                    println!("{}", line);
                    continue;
                }

                println!("\n[{}] scan #{}", Local::now().format("%H:%M:%S"), snapshot.completed_scans);
                match &snapshot.error_message {
                    Some(message) => eprintln!("{}", message),
                    None => print_table(&snapshot.ports),
                }
            }
            _ = &mut ctrl_c => {
                break;
            }
        }
    }

    Ok(())
}
