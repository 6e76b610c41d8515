//! Port scanner adapter backed by lsof.
//!
//! The same tool is used for both sub-scans; only the protocol selector
//! differs. See [`OutputFormat`] for the exact invocations.

mod parser;
mod utils;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::adapters::command::{find_executable, run_command};
use crate::config::Config;
use crate::domain::{PortRecord, TransportProtocol};
use crate::error::ScanError;
use crate::ports::PortScannerPort;

pub use parser::OutputFormat;
pub use utils::Utils;

/// Default paths to search for lsof.
const LSOF_PATHS: &[&str] = &[
    "/usr/sbin/lsof", // macOS
    "/usr/bin/lsof",  // Most Linux distributions
    "/bin/lsof",
];

/// Port scanner that runs lsof and parses its output.
#[derive(Debug, Clone)]
pub struct LsofScanner {
    program: PathBuf,
    format: OutputFormat,
    timeout: Duration,
}

impl LsofScanner {
    /// Create a scanner using the first lsof found and default settings.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create a scanner from configuration.
    pub fn from_config(config: &Config) -> Self {
        let program = config
            .lsof_path
            .clone()
            .unwrap_or_else(|| find_executable(LSOF_PATHS, "lsof"));
        Self::with_program(program, config.output_format, config.command_timeout())
    }

    /// Create a scanner with an explicit lsof binary (for testing).
    pub fn with_program(program: impl Into<PathBuf>, format: OutputFormat, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            format,
            timeout,
        }
    }

    /// Path of the lsof binary in use.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Output shape requested from lsof.
    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl Default for LsofScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortScannerPort for LsofScanner {
    /// Run one lsof sub-scan.
    ///
    /// The exit status is advisory: lsof exits 1 when nothing matches and
    /// may exit non-zero after printing valid data, so stdout is always
    /// parsed.
    async fn scan_protocol(&self, protocol: TransportProtocol) -> Result<Vec<PortRecord>, ScanError> {
        let args = self.format.lsof_args(protocol);
        let output = run_command(&self.program, &args, self.timeout)
            .await
            .map_err(|e| e.into_scan_error(&self.program))?;

        if !output.stderr.is_empty() {
            debug!(
                protocol = %protocol,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "lsof wrote to stderr"
            );
        }
        if !output.status.success() {
            debug!(protocol = %protocol, status = ?output.status.code(), "lsof exited with non-zero status");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = self.format.parse(&stdout, protocol);
        debug!(
            protocol = %protocol,
            format = %self.format,
            bytes = stdout.len(),
            records = records.len(),
            "Parsed lsof output"
        );
        Ok(records)
    }
}
