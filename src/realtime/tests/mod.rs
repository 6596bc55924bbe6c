//! Unit tests for the realtime module.
//!
//! Registry and routing tests drive the services directly; hub and gateway
//! tests go through the command channel the services share in production.

mod helpers;
mod hub_tests;
mod registry_tests;
