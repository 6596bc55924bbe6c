//! Role-scoped dashboard snapshots.
//!
//! Snapshots are recomputed from the task and user stores on every request.
//! Counter deltas carried by task events are advisory hints for clients; the
//! aggregator never reads them back.

pub mod domain;
pub mod ports;
pub mod services;
