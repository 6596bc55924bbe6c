//! Port contracts for outbound connection transport.

pub mod sink;

pub use sink::{ConnectionSink, DeliveryError};

#[cfg(test)]
pub use sink::MockConnectionSink;
