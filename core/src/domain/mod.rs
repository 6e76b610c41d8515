//! Domain layer - Pure data models.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod port;

pub use port::{
    filter_ports, PortFilter, PortRecord, TransportProtocol, LISTEN_STATE, UDP_STATE,
    WILDCARD_ADDRESS,
};
