//! Real-time fan-out of task and user lifecycle events.
//!
//! Authenticated connections are tracked by a registry owned by a single hub
//! actor. Domain events arrive at the hub over a channel after the mutation
//! that caused them has been persisted; the hub routes each event to its
//! rooms and pushes one serialized frame to every member connection.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Registry, router, broadcaster, hub and gateway in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
