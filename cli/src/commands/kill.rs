//! Kill command - SIGKILL a process, then show the list after the delayed rescan.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use portmanager_core::{EngineOptions, Snapshot};

use super::list::print_table;
use super::{load_config, start_engine};

pub async fn run(pid: u32, yes: bool, json: bool) -> Result<()> {
    let config = load_config().await?;
    let engine = start_engine(&config, EngineOptions::from_config(&config));
    let mut updates = engine.subscribe();

    engine.scan();
    let before = wait_for(&mut updates, |s| s.completed_scans >= 1).await?;
    if let Some(message) = &before.error_message {
        bail!("{}", message);
    }

    let owned: Vec<_> = before.ports.iter().filter(|r| r.pid == pid).collect();
    if owned.is_empty() {
        println!("No bound port is owned by PID {}.", pid);
    } else {
        for record in &owned {
            println!(
                "{} port {} ({}) held by {}",
                record.protocol,
                record.port,
                record.address,
                record.display_process()
            );
        }
    }

    if !yes && !confirm(pid)? {
        println!("Aborted.");
        return Ok(());
    }

    engine.kill(pid);
    let after = wait_for(&mut updates, |s| {
        s.error_message.is_some() || s.completed_scans >= 2
    })
    .await?;

    match KillOutcome::of(&after) {
        KillOutcome::KillFailed(message) => bail!("{}", message),
        KillOutcome::RescanFailed(message) => {
            println!("Killed PID {}.", pid);
            bail!("Could not refresh the port list: {}", message);
        }
        KillOutcome::Refreshed => {}
    }

    if json {
        println!("{}", serde_json::to_string_pretty(after.ports.as_ref())?);
        return Ok(());
    }

    println!("Killed PID {}.\n", pid);
    print_table(&after.ports);
    Ok(())
}

/// What the engine published once a kill request settled.
#[derive(Debug, PartialEq, Eq)]
enum KillOutcome<'a> {
    /// The kill itself failed; no rescan was scheduled.
    KillFailed(&'a str),
    /// The kill succeeded but the follow-up scan failed.
    RescanFailed(&'a str),
    /// The kill succeeded and the list was rescanned.
    Refreshed,
}

impl<'a> KillOutcome<'a> {
    /// Classify a snapshot taken after the pre-kill scan (scan #1).
    fn of(snapshot: &'a Snapshot) -> Self {
        match snapshot.error_message.as_deref() {
            Some(message) if snapshot.completed_scans >= 2 => KillOutcome::RescanFailed(message),
            Some(message) => KillOutcome::KillFailed(message),
            None => KillOutcome::Refreshed,
        }
    }
}

async fn wait_for(
    updates: &mut tokio::sync::watch::Receiver<Snapshot>,
    condition: impl FnMut(&Snapshot) -> bool,
) -> Result<Snapshot> {
    let snapshot = updates
        .wait_for(condition)
        .await
        .context("Engine stopped unexpectedly")?
        .clone();
    Ok(snapshot)
}

fn confirm(pid: u32) -> Result<bool> {
    print!("Kill PID {} with SIGKILL? [y/N] ", pid);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}
