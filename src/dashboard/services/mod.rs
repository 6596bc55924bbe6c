//! Dashboard services.

mod aggregator;

pub use crate::dashboard::ports::{DashboardError, DashboardResult};
pub use aggregator::DashboardAggregator;
