//! Parsing of lsof output into port records.
//!
//! Two output shapes are supported, selected once through [`OutputFormat`]:
//!
//! Tagged fields (`lsof -F pcn`), one field per line keyed by its first
//! character:
//! ```text
//! p34805
//! cnode
//! f19
//! n[::1]:3000
//! ```
//!
//! Columns (default lsof output):
//! ```text
//! COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
//! node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
//! ```
//!
//! Parsing is best effort per line: anything that cannot be resolved into a
//! port, PID, process name and address is skipped.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{PortRecord, TransportProtocol, LISTEN_STATE, UDP_STATE};

use super::utils::Utils;

/// Columnar lines need at least COMMAND through NAME.
const COLUMNAR_MIN_TOKENS: usize = 9;

/// Index of the NAME (address:port) column.
const COLUMNAR_NAME_INDEX: usize = 8;

/// Output shape requested from lsof and expected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputFormat {
    /// `-F pcn` machine-readable field output.
    #[default]
    TaggedField,
    /// Human-readable column output.
    Columnar,
}

impl OutputFormat {
    /// Arguments for lsof that produce this shape for `protocol`.
    ///
    /// Addresses and ports are always numeric (`-n -P`). TCP is restricted
    /// to listening sockets; UDP has no state to filter on.
    pub fn lsof_args(&self, protocol: TransportProtocol) -> Vec<&'static str> {
        let mut args = match protocol {
            TransportProtocol::Tcp => vec!["-iTCP", "-sTCP:LISTEN"],
            TransportProtocol::Udp => vec!["-iUDP"],
        };
        args.extend(["-n", "-P"]);
        if *self == OutputFormat::TaggedField {
            args.extend(["-F", "pcn"]);
        }
        args
    }

    /// Parse raw lsof output in this shape into records tagged with `protocol`.
    pub fn parse(&self, output: &str, protocol: TransportProtocol) -> Vec<PortRecord> {
        match self {
            OutputFormat::TaggedField => parse_tagged_fields(output, protocol),
            OutputFormat::Columnar => parse_columns(output, protocol),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::TaggedField => f.write_str("tagged-field"),
            OutputFormat::Columnar => f.write_str("columnar"),
        }
    }
}

fn parse_tagged_fields(output: &str, protocol: TransportProtocol) -> Vec<PortRecord> {
    let mut records = Vec::new();
    let mut current_pid: Option<u32> = None;
    let mut current_command: Option<&str> = None;

    for line in output.lines() {
        let mut chars = line.chars();
        let Some(tag) = chars.next() else {
            continue;
        };
        let value = chars.as_str();

        match tag {
            'p' => {
                // A new process set starts; its command follows.
                current_pid = Utils::parse_pid(value);
                current_command = None;
                trace!(value, pid = ?current_pid, "Found process id field");
            }
            'c' => {
                current_command = Some(value);
                trace!(command = value, "Found command field");
            }
            'n' => {
                let (Some(pid), Some(command)) = (current_pid, current_command) else {
                    trace!(
                        network = value,
                        "Skipping network field without pid or command in scope"
                    );
                    continue;
                };
                if let Some(record) = build_record(protocol, None, command, pid, value) {
                    records.push(record);
                }
            }
            _ => {}
        }
    }

    records
}

fn parse_columns(output: &str, protocol: TransportProtocol) -> Vec<PortRecord> {
    let mut records = Vec::new();

    // Skip header line
    for line in output.lines().skip(1) {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < COLUMNAR_MIN_TOKENS {
            trace!(line, "Skipping short line");
            continue;
        }

        let process_name = components[0]
            .replace("\\x20", " ") // Space
            .replace("\\x2f", "/"); // Slash

        let Some(pid) = Utils::parse_pid(components[1]) else {
            trace!(value = components[1], "Skipping line with invalid pid");
            continue;
        };

        let state = components
            .get(COLUMNAR_NAME_INDEX + 1)
            .map(|token| token.trim_start_matches('(').trim_end_matches(')'))
            .filter(|token| !token.is_empty());

        if let Some(record) = build_record(
            protocol,
            state,
            &process_name,
            pid,
            components[COLUMNAR_NAME_INDEX],
        ) {
            records.push(record);
        }
    }

    records
}

fn build_record(
    protocol: TransportProtocol,
    reported_state: Option<&str>,
    process_name: &str,
    pid: u32,
    network: &str,
) -> Option<PortRecord> {
    let Some((address, port)) = Utils::parse_address(network) else {
        trace!(network, "Failed to parse port");
        return None;
    };

    let state = match protocol {
        TransportProtocol::Tcp => reported_state.unwrap_or(LISTEN_STATE),
        TransportProtocol::Udp => UDP_STATE,
    };

    trace!(port, pid, process_name, address = %address, "Parsed port");
    Some(PortRecord::new(port, protocol, state, process_name, pid, address))
}
