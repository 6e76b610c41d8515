//! PortManager Core Library
//!
//! Lists the TCP and UDP ports bound on the local machine together with
//! their owning processes, and terminates those processes on request.
//! Provides functionality to:
//! - Scan listening TCP sockets and UDP sockets through `lsof`
//! - Kill processes by PID with SIGKILL through `kill`
//! - Publish scan state from a background engine with post-kill rescans
//! - Load and save user configuration
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models and filtering
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External command implementations
//! - `application`: Use case services
//! - `engine`: Published state and task orchestration
//!
//! # Platform Support
//! Unix-like systems with `lsof` and `kill` available (macOS, Linux, BSD).

// Hexagonal architecture layers
pub mod domain;
pub mod ports;
pub mod adapters;
pub mod application;

pub mod config;
pub mod engine;
pub mod error;

#[cfg(test)]
mod test_support;

// Re-export domain types (primary API)
pub use domain::{filter_ports, PortFilter, PortRecord, TransportProtocol};

// Re-export other commonly used types
pub use adapters::{KillCommand, LsofScanner, OutputFormat};
pub use application::PortService;
pub use config::{Config, ConfigStore};
pub use engine::{EngineOptions, PortManagerEngine, Snapshot};
pub use error::{Error, KillError, Result, ScanError};
pub use ports::{PortScannerPort, ProcessKillerPort};
