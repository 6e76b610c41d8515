//! Port binding domain models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State label given to every TCP record from a listen-only scan that
/// does not report the state itself.
pub const LISTEN_STATE: &str = "LISTEN";

/// State label given to every UDP record. UDP sockets have no connection state.
pub const UDP_STATE: &str = "UDP";

/// Address used for wildcard (any-address) bindings.
pub const WILDCARD_ADDRESS: &str = "*";

// ============================================================================
// TransportProtocol
// ============================================================================

/// Transport protocol of a socket binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportProtocol {
    Tcp,
    Udp,
}

impl TransportProtocol {
    /// Upper-case protocol name ("TCP" / "UDP").
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportProtocol::Tcp => "TCP",
            TransportProtocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportProtocol::Tcp),
            "udp" => Ok(TransportProtocol::Udp),
            other => Err(format!("unknown protocol '{}' (expected tcp or udp)", other)),
        }
    }
}

// ============================================================================
// PortRecord
// ============================================================================

/// One observed socket binding and the process that owns it.
///
/// Records are produced fresh by every scan and never mutated. The `id` is
/// only unique within the scan that produced it and must not be used to
/// match records across scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRecord {
    /// Scan-local identifier for list diffing.
    pub id: Uuid,
    /// The bound local port number.
    pub port: u16,
    /// TCP or UDP.
    pub protocol: TransportProtocol,
    /// Socket state ("LISTEN" for TCP listeners, "UDP" for UDP sockets).
    pub state: String,
    /// Short process name as reported by the listing tool. May be truncated.
    pub process_name: String,
    /// Process ID of the owner. Always positive.
    pub pid: u32,
    /// Local address the socket is bound to, `*` for wildcard.
    pub address: String,
}

impl PortRecord {
    /// Create a record from parsed fields.
    ///
    /// An empty address normalizes to `*`.
    pub fn new(
        port: u16,
        protocol: TransportProtocol,
        state: impl Into<String>,
        process_name: impl Into<String>,
        pid: u32,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            port,
            protocol,
            state: state.into(),
            process_name: process_name.into(),
            pid,
            address: normalize_address(address.into()),
        }
    }

    /// Get the formatted port number for display.
    pub fn display_port(&self) -> String {
        self.port.to_string()
    }

    /// Get the owning process for display, e.g. `node (PID: 1234)`.
    pub fn display_process(&self) -> String {
        format!("{} (PID: {})", self.process_name, self.pid)
    }

    /// Identity of the binding itself, ignoring the scan-local `id`.
    pub fn binding_key(&self) -> (u16, TransportProtocol, u32, String, String) {
        (
            self.port,
            self.protocol,
            self.pid,
            self.address.clone(),
            self.state.clone(),
        )
    }

    /// Check if this record matches a free-text search query.
    ///
    /// Matches the port and PID as substrings and the process name
    /// case-insensitively.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query_lower = query.to_lowercase();
        self.port.to_string().contains(&query_lower)
            || self.process_name.to_lowercase().contains(&query_lower)
            || self.pid.to_string().contains(&query_lower)
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}:{} (PID: {}, Process: {})",
            self.protocol, self.address, self.port, self.pid, self.process_name
        )
    }
}

fn normalize_address(address: String) -> String {
    if address.is_empty() {
        WILDCARD_ADDRESS.to_string()
    } else {
        address
    }
}

// ============================================================================
// PortFilter
// ============================================================================

/// Filter criteria for port listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortFilter {
    /// Text to search across port, PID and process name.
    #[serde(default)]
    pub search_text: String,
    /// Only this exact port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Only this protocol.
    #[serde(default)]
    pub protocol: Option<TransportProtocol>,
}

impl PortFilter {
    /// Create a new filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the filter has any active conditions.
    pub fn is_active(&self) -> bool {
        !self.search_text.is_empty() || self.port.is_some() || self.protocol.is_some()
    }

    /// Check if a record matches all filter criteria.
    pub fn matches(&self, record: &PortRecord) -> bool {
        if let Some(port) = self.port {
            if record.port != port {
                return false;
            }
        }
        if let Some(protocol) = self.protocol {
            if record.protocol != protocol {
                return false;
            }
        }
        record.matches_search(&self.search_text)
    }

    /// Set the search text.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Restrict to a single port.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Restrict to a single protocol.
    pub fn with_protocol(mut self, protocol: Option<TransportProtocol>) -> Self {
        self.protocol = protocol;
        self
    }
}

/// Apply a filter to a list of records, keeping their order.
pub fn filter_ports(records: &[PortRecord], filter: &PortFilter) -> Vec<PortRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
