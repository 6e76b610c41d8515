//! Port scanner port (interface).

use crate::domain::{PortRecord, TransportProtocol};
use crate::error::ScanError;

/// Port for listing bound sockets of one protocol.
///
/// One call is one sub-scan: run the listing tool for `protocol` and parse
/// its output. Merging TCP and UDP results is done by the application layer.
pub trait PortScannerPort: Send + Sync {
    /// List the sockets of `protocol` with their owning processes.
    ///
    /// Lines that cannot be parsed are dropped; only failing to run the
    /// listing tool is an error.
    fn scan_protocol(
        &self,
        protocol: TransportProtocol,
    ) -> impl std::future::Future<Output = Result<Vec<PortRecord>, ScanError>> + Send;
}
