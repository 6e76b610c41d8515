//! Scripted scanner and killer used by the unit tests.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::{PortRecord, TransportProtocol, LISTEN_STATE, UDP_STATE};
use crate::error::{KillError, ScanError};
use crate::ports::{PortScannerPort, ProcessKillerPort};

/// Scanner returning fixed ports per protocol. `None` simulates a launch
/// failure. Every record is owned by PID `1000 + port`.
#[derive(Clone)]
pub(crate) struct MockScanner {
    tcp: Arc<Mutex<Option<Vec<u16>>>>,
    udp: Arc<Mutex<Option<Vec<u16>>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<TransportProtocol>>>,
}

impl MockScanner {
    pub(crate) fn new(tcp: Option<Vec<u16>>, udp: Option<Vec<u16>>) -> Self {
        Self {
            tcp: Arc::new(Mutex::new(tcp)),
            udp: Arc::new(Mutex::new(udp)),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make every sub-scan take `delay` before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn set_tcp(&self, ports: Option<Vec<u16>>) {
        *self.tcp.lock() = ports;
    }

    pub(crate) fn calls(&self) -> Vec<TransportProtocol> {
        self.calls.lock().clone()
    }

    /// Number of scans started, counted by TCP sub-scans.
    pub(crate) fn scans(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|p| **p == TransportProtocol::Tcp)
            .count()
    }
}

impl PortScannerPort for MockScanner {
    async fn scan_protocol(&self, protocol: TransportProtocol) -> Result<Vec<PortRecord>, ScanError> {
        self.calls.lock().push(protocol);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let (ports, state) = match protocol {
            TransportProtocol::Tcp => (self.tcp.lock().clone(), LISTEN_STATE),
            TransportProtocol::Udp => (self.udp.lock().clone(), UDP_STATE),
        };

        match ports {
            Some(ports) => Ok(ports
                .into_iter()
                .map(|port| PortRecord::new(port, protocol, state, "mock", 1000 + u32::from(port), "*"))
                .collect()),
            None => Err(ScanError::Launch {
                program: "lsof".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
        }
    }
}

/// Killer that records every PID and either succeeds or reports permission denied.
#[derive(Clone)]
pub(crate) struct MockKiller {
    succeed: bool,
    kills: Arc<Mutex<Vec<u32>>>,
}

impl MockKiller {
    pub(crate) fn succeeding() -> Self {
        Self {
            succeed: true,
            kills: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            succeed: false,
            kills: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn kills(&self) -> Vec<u32> {
        self.kills.lock().clone()
    }
}

impl ProcessKillerPort for MockKiller {
    async fn kill(&self, pid: u32) -> Result<(), KillError> {
        self.kills.lock().push(pid);
        if self.succeed {
            Ok(())
        } else {
            Err(KillError::PermissionDenied(pid))
        }
    }
}
