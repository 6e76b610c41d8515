//! Process killer adapter backed by the `kill` utility.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::adapters::command::{find_executable, run_command};
use crate::config::Config;
use crate::error::KillError;
use crate::ports::ProcessKillerPort;

/// Default paths to search for kill.
const KILL_PATHS: &[&str] = &["/bin/kill", "/usr/bin/kill"];

/// Kills processes with `kill -9 <pid>`.
#[derive(Debug, Clone)]
pub struct KillCommand {
    program: PathBuf,
    timeout: Duration,
}

impl KillCommand {
    /// Create a killer using the first kill binary found and default settings.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create a killer from configuration.
    pub fn from_config(config: &Config) -> Self {
        let program = config
            .kill_path
            .clone()
            .unwrap_or_else(|| find_executable(KILL_PATHS, "kill"));
        Self::with_program(program, config.command_timeout())
    }

    /// Create a killer with an explicit kill binary (for testing).
    pub fn with_program(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Path of the kill binary in use.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for KillCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessKillerPort for KillCommand {
    async fn kill(&self, pid: u32) -> Result<(), KillError> {
        if pid == 0 {
            return Err(KillError::InvalidPid(pid));
        }

        debug!(pid = pid, "Sending SIGKILL");

        let pid_arg = pid.to_string();
        let output = run_command(&self.program, &["-9", pid_arg.as_str()], self.timeout)
            .await
            .map_err(|e| e.into_kill_error(&self.program))?;

        if output.status.success() {
            debug!(pid = pid, "SIGKILL sent successfully");
            return Ok(());
        }

        // Check stderr for common error conditions
        let stderr = String::from_utf8_lossy(&output.stderr);

        if stderr.contains("No such process") {
            debug!(pid = pid, "Process not found");
            return Err(KillError::ProcessNotFound(pid));
        }

        if stderr.contains("Operation not permitted") || stderr.contains("Permission denied") {
            warn!(pid = pid, "Permission denied to kill process");
            return Err(KillError::PermissionDenied(pid));
        }

        let reason = match stderr.trim() {
            "" => format!("kill exited with {}", output.status),
            message => message.to_string(),
        };
        warn!(pid = pid, reason = %reason, "kill reported failure");
        Err(KillError::Failed { pid, reason })
    }
}
