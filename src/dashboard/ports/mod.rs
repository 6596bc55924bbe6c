//! Port contracts for dashboard consumers.

pub mod provider;

pub use provider::{DashboardError, DashboardResult, SnapshotProvider};

#[cfg(test)]
pub use provider::MockSnapshotProvider;
