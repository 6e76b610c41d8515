//! Process killer port (interface).

use crate::error::KillError;

/// Port for killing processes.
pub trait ProcessKillerPort: Send + Sync {
    /// Kill a process by PID with an unconditional signal (SIGKILL).
    fn kill(&self, pid: u32) -> impl std::future::Future<Output = Result<(), KillError>> + Send;
}
