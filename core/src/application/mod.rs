//! Application layer - Use case services.
//!
//! Services accept domain types, reach external systems only through the
//! traits in `ports`, and return domain types.

mod port_service;

pub use port_service::PortService;
