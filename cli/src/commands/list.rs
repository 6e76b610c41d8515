//! List command - show all bound ports.

use anyhow::{Context, Result};
use portmanager_core::{
    filter_ports, LsofScanner, PortFilter, PortRecord, PortService, TransportProtocol,
};

use super::load_config;

pub async fn run(
    port: Option<u16>,
    search: Option<String>,
    protocol: Option<TransportProtocol>,
    json: bool,
) -> Result<()> {
    let config = load_config().await?;
    let service = PortService::new(LsofScanner::from_config(&config));
    let records = service.scan().await.context("Error scanning ports")?;

    let filter = PortFilter::new()
        .with_search(search.unwrap_or_default())
        .with_port(port)
        .with_protocol(protocol);
    let records = if filter.is_active() {
        filter_ports(&records, &filter)
    } else {
        records
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    print_table(&records);
    Ok(())
}

/// Print records as a table, or a notice when there are none.
pub fn print_table(records: &[PortRecord]) {
    if records.is_empty() {
        println!("No bound ports found.");
        return;
    }

    println!(
        "{:<6} {:<5} {:<8} {:<8} {:<20} ADDRESS",
        "PORT", "PROTO", "STATE", "PID", "PROCESS"
    );
    println!("{}", "-".repeat(70));

    for record in records {
        println!(
            "{:<6} {:<5} {:<8} {:<8} {:<20} {}",
            record.display_port(),
            record.protocol,
            record.state,
            record.pid,
            truncate(&record.process_name, 20),
            record.address
        );
    }

    println!("\nTotal: {} ports", records.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
