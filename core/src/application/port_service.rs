//! Port scanning application service.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::{PortRecord, TransportProtocol};
use crate::error::ScanError;
use crate::ports::PortScannerPort;

/// Application service that turns two sub-scans into one port listing.
///
/// The TCP sub-scan is authoritative: if it fails, the whole scan fails.
/// The UDP sub-scan is best effort and its failures are logged and dropped.
pub struct PortService<S: PortScannerPort> {
    scanner: S,
}

impl<S: PortScannerPort> PortService<S> {
    /// Create a new port service with the given scanner.
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }

    /// The underlying scanner.
    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    /// Scan TCP listeners, then UDP sockets, and return the merged records
    /// sorted by port.
    pub async fn scan(&self) -> Result<Vec<PortRecord>, ScanError> {
        let mut records = match self.scanner.scan_protocol(TransportProtocol::Tcp).await {
            Ok(records) => {
                debug!(count = records.len(), "TCP sub-scan complete");
                records
            }
            Err(e) => {
                warn!(error = %e, "TCP sub-scan failed");
                return Err(e);
            }
        };

        match self.scanner.scan_protocol(TransportProtocol::Udp).await {
            Ok(udp) => {
                debug!(count = udp.len(), "UDP sub-scan complete");
                records.extend(udp);
            }
            Err(e) => {
                // UDP is optional, continue with TCP results only
                debug!(error = %e, "UDP sub-scan failed, ignoring");
            }
        }

        let merged = merge_records(records);
        debug!(count = merged.len(), "Scan complete");
        Ok(merged)
    }
}

/// Collapse exact duplicate bindings and stable-sort by port.
fn merge_records(records: Vec<PortRecord>) -> Vec<PortRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<PortRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.binding_key()))
        .collect();
    merged.sort_by_key(|r| r.port);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockScanner;

    fn ports(records: &[PortRecord]) -> Vec<u16> {
        records.iter().map(|r| r.port).collect()
    }

    #[tokio::test]
    async fn test_merge_and_sort() {
        let service = PortService::new(MockScanner::new(Some(vec![443, 80]), Some(vec![53])));
        let records = service.scan().await.unwrap();

        assert_eq!(ports(&records), vec![53, 80, 443]);
        assert_eq!(records[0].protocol, TransportProtocol::Udp);
        assert_eq!(records[0].state, "UDP");
        assert_eq!(records[1].protocol, TransportProtocol::Tcp);
        assert_eq!(records[1].state, "LISTEN");
    }

    #[tokio::test]
    async fn test_tcp_runs_before_udp() {
        let scanner = MockScanner::new(Some(vec![80]), Some(vec![53]));
        let service = PortService::new(scanner.clone());
        service.scan().await.unwrap();

        assert_eq!(
            scanner.calls(),
            vec![TransportProtocol::Tcp, TransportProtocol::Udp]
        );
    }

    #[tokio::test]
    async fn test_udp_failure_is_swallowed() {
        let service = PortService::new(MockScanner::new(Some(vec![443, 80]), None));
        let records = tokio_test::assert_ok!(service.scan().await);
        assert_eq!(ports(&records), vec![80, 443]);
    }

    #[tokio::test]
    async fn test_tcp_failure_is_fatal() {
        for udp in [Some(vec![53]), None] {
            let service = PortService::new(MockScanner::new(None, udp));
            let err = tokio_test::assert_err!(service.scan().await);
            assert!(matches!(err, ScanError::Launch { .. }));
        }
    }

    #[tokio::test]
    async fn test_empty_scan_is_not_an_error() {
        let service = PortService::new(MockScanner::new(Some(vec![]), Some(vec![])));
        let records = service.scan().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_scans_are_set_equal() {
        let service = PortService::new(MockScanner::new(Some(vec![8080, 22, 8080]), Some(vec![53])));

        let first = service.scan().await.unwrap();
        let second = service.scan().await.unwrap();
        assert_eq!(first.len(), 3);

        let mut first: Vec<_> = first.iter().map(PortRecord::binding_key).collect();
        let mut second: Vec<_> = second.iter().map(PortRecord::binding_key).collect();
        first.sort();
        second.sort();
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_collapses_exact_duplicates_only() {
        let records = vec![
            PortRecord::new(80, TransportProtocol::Tcp, "LISTEN", "nginx", 1, "*"),
            PortRecord::new(80, TransportProtocol::Tcp, "LISTEN", "nginx", 1, "*"),
            PortRecord::new(80, TransportProtocol::Tcp, "LISTEN", "nginx", 1, "[::]"),
            PortRecord::new(80, TransportProtocol::Tcp, "LISTEN", "nginx", 2, "*"),
        ];
        let merged = merge_records(records);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].address, "[::]");
        assert_eq!(merged[2].pid, 2);
    }
}
