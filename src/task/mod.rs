//! Task lifecycle management.
//!
//! Members keep personal tasks for themselves; managers create project tasks
//! and assign them to members. Every operation is checked against a fixed
//! permission table, status changes follow a closed transition graph, and
//! each accepted change to a tracked field is recorded in the task's
//! history together with the dashboard counter deltas it causes. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
