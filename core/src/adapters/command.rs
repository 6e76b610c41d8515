//! External command execution shared by the lsof and kill adapters.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{KillError, ScanError};

/// Why an external command produced no output.
#[derive(Debug)]
pub(crate) enum RunError {
    Launch(std::io::Error),
    TimedOut(Duration),
}

impl RunError {
    pub(crate) fn into_scan_error(self, program: &Path) -> ScanError {
        let program = program.display().to_string();
        match self {
            RunError::Launch(source) => ScanError::Launch { program, source },
            RunError::TimedOut(timeout) => ScanError::TimedOut { program, timeout },
        }
    }

    pub(crate) fn into_kill_error(self, program: &Path) -> KillError {
        let program = program.display().to_string();
        match self {
            RunError::Launch(source) => KillError::Launch { program, source },
            RunError::TimedOut(timeout) => KillError::TimedOut { program, timeout },
        }
    }
}

/// Run `program` with `args`, capturing stdout and stderr.
///
/// The exit status is returned as-is and not interpreted. A child still
/// running when `limit` elapses is killed.
pub(crate) async fn run_command(
    program: &Path,
    args: &[&str],
    limit: Duration,
) -> Result<Output, RunError> {
    debug!(program = %program.display(), args = ?args, "Running command");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(limit, command.output()).await {
        Ok(Ok(output)) => {
            debug!(
                program = %program.display(),
                status = ?output.status.code(),
                stdout_bytes = output.stdout.len(),
                "Command exited"
            );
            Ok(output)
        }
        Ok(Err(e)) => Err(RunError::Launch(e)),
        Err(_) => Err(RunError::TimedOut(limit)),
    }
}

/// Finds an executable in the given paths, falling back to a bare name
/// resolved through `PATH`.
pub(crate) fn find_executable(paths: &[&str], fallback: &str) -> PathBuf {
    paths
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(fallback))
}
