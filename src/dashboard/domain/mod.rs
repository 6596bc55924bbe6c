//! Dashboard value objects.

mod snapshot;

pub use snapshot::{
    AdminDashboard, DashboardSnapshot, ManagerDashboard, MemberDashboard, RecentTask, RoleCounts,
    StatusCounts,
};
