//! Tunables shared by the task, realtime and dashboard services.
//!
//! Loading is left to the embedding process; the value deserializes from any
//! serde format and every field falls back to its default when absent.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for the core services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TaskhubConfig {
    /// How long a new connection may take to present a credential.
    pub auth_timeout_ms: u64,
    /// Page size used when a listing request does not specify one.
    pub default_page_size: usize,
    /// Upper bound on requested page sizes.
    pub max_page_size: usize,
    /// Number of entries in dashboard recent-activity lists.
    pub recent_activity_limit: usize,
    /// Window, in hours, for a member's "due soon" count.
    pub due_soon_window_hours: i64,
    /// Push recomputed manager dashboards after project task mutations.
    pub refresh_dashboards_on_mutation: bool,
}

impl TaskhubConfig {
    /// Returns the authentication timeout.
    #[must_use]
    pub const fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    /// Returns the due-soon window.
    #[must_use]
    pub fn due_soon_window(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::try_hours(self.due_soon_window_hours).unwrap_or(chrono::TimeDelta::MAX)
    }

    /// Clamps a requested page size into `1..=max_page_size`.
    #[must_use]
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl Default for TaskhubConfig {
    fn default() -> Self {
        Self {
            auth_timeout_ms: 10_000,
            default_page_size: 20,
            max_page_size: 100,
            recent_activity_limit: 5,
            due_soon_window_hours: 48,
            refresh_dashboards_on_mutation: true,
        }
    }
}
