//! Taskhub: role-scoped task management with real-time event fan-out.
//!
//! Tasks move through a fixed status graph under a table-driven permission
//! model spanning three roles. Every accepted change to a project task is
//! pushed to the connections of the manager who owns it, and user lifecycle
//! changes are broadcast to everyone connected.
//!
//! # Architecture
//!
//! Each module follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: In-memory implementations of ports
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`identity`]: Roles, identity summaries and credential verification
//! - [`task`]: Task lifecycle, permission table and counter deltas
//! - [`realtime`]: Connection registry, room routing and event broadcast
//! - [`dashboard`]: Role-scoped dashboard snapshots
//! - [`config`]: Runtime tunables

pub mod config;
pub mod dashboard;
pub mod identity;
pub mod realtime;
pub mod task;
