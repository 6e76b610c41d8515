//! Error types for the portmanager-core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for portmanager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from a listing sub-scan.
///
/// Unparsable lines never produce an error; they are dropped. Only failing to
/// run the listing tool at all is reported.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The listing command could not be started.
    #[error("Failed to run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The listing command did not exit in time and was killed.
    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Errors from terminating a process.
#[derive(Error, Debug)]
pub enum KillError {
    /// PID 0 addresses the caller's process group and is never accepted.
    #[error("Invalid PID: {0}")]
    InvalidPid(u32),

    /// The termination command could not be started.
    #[error("Failed to run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The termination command did not exit in time and was killed.
    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// The specified process was not found.
    #[error("Process with PID {0} not found")]
    ProcessNotFound(u32),

    /// Permission denied to kill the process.
    #[error("Permission denied to kill process {0}")]
    PermissionDenied(u32),

    /// The termination command reported some other failure.
    #[error("Failed to kill process {pid}: {reason}")]
    Failed { pid: u32, reason: String },
}

/// Errors that can occur in the library.
#[derive(Error, Debug)]
pub enum Error {
    /// Listing the bound ports failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Terminating a process failed.
    #[error(transparent)]
    Kill(#[from] KillError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KillError::ProcessNotFound(1234);
        assert!(err.to_string().contains("1234"));

        let err = KillError::PermissionDenied(5678);
        assert!(err.to_string().contains("5678"));

        let err = ScanError::TimedOut {
            program: "lsof".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "lsof timed out after 10s");

        let err: Error = KillError::InvalidPid(0).into();
        assert_eq!(err.to_string(), "Invalid PID: 0");
    }
}
