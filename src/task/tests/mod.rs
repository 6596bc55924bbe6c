//! Unit tests for the task module.
//!
//! Domain tests exercise the aggregate and the permission table without I/O;
//! service tests drive the lifecycle service over the in-memory adapters and
//! inspect what it hands to the realtime hub.
