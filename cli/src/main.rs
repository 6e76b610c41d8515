//! PortManager CLI - List bound ports and kill their processes
//!
//! A command-line tool for scanning TCP listeners and UDP sockets,
//! killing the owning processes, and watching the list refresh.

#![deny(unused_crate_dependencies)]

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portmanager_core::TransportProtocol;

#[derive(Parser)]
#[command(name = "portmanager")]
#[command(author, version, about = "List bound ports and kill their processes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List all bound ports
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Search port, PID and process name
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by protocol (tcp or udp)
        #[arg(long)]
        protocol: Option<TransportProtocol>,
    },

    /// Kill a process with SIGKILL and show the refreshed list
    Kill {
        /// Process ID to kill
        pid: u32,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rescan periodically and print every update until Ctrl-C
    Watch {
        /// Seconds between scans (defaults to the configured refreshInterval)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Some(Commands::List {
            port,
            search,
            protocol,
        }) => {
            commands::list::run(port, search, protocol, cli.json).await?;
        }
        Some(Commands::Kill { pid, yes }) => {
            commands::kill::run(pid, yes, cli.json).await?;
        }
        Some(Commands::Watch { interval }) => {
            commands::watch::run(interval, cli.json).await?;
        }
        Some(Commands::Config) => {
            commands::config::show(cli.json).await?;
        }
        None => {
            // Default: list everything
            commands::list::run(None, None, None, cli.json).await?;
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` applies only when no `-v` flag is given.
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
