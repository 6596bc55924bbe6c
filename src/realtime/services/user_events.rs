//! Publication of user lifecycle events.

use super::HubHandle;
use crate::dashboard::ports::SnapshotProvider;
use crate::identity::domain::{Actor, Role, UserSummary};
use crate::realtime::domain::{DashboardAudience, DomainEvent, UserAction};
use mockable::Clock;
use std::sync::Arc;
use tracing::warn;

/// Publishes user lifecycle events reported by the user-management
/// collaborator.
pub struct UserEventPublisher<C>
where
    C: Clock + Send + Sync,
{
    hub: HubHandle,
    clock: Arc<C>,
    dashboards: Option<Arc<dyn SnapshotProvider>>,
}

impl<C> UserEventPublisher<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a publisher that pushes no dashboards.
    #[must_use]
    pub const fn new(hub: HubHandle, clock: Arc<C>) -> Self {
        Self {
            hub,
            clock,
            dashboards: None,
        }
    }

    /// Refreshes the administrators' dashboard after every user event.
    #[must_use]
    pub fn with_dashboards(mut self, dashboards: Arc<dyn SnapshotProvider>) -> Self {
        self.dashboards = Some(dashboards);
        self
    }

    /// Publishes `action` on `subject`, performed by `actor`.
    ///
    /// User counts feed the administrators' dashboard, so a fresh admin
    /// snapshot follows the event when dashboards are wired in. Deactivation,
    /// deletion and role changes then end the subject's live sessions, so
    /// reconnecting clients pick up their new rooms or are refused.
    pub async fn publish_user_event(
        &self,
        action: UserAction,
        subject: &UserSummary,
        actor: &Actor,
    ) {
        self.hub.publish(DomainEvent::for_user(
            action,
            subject,
            actor,
            action.notifies_subject(),
            self.clock.utc(),
        ));
        if let Some(dashboards) = &self.dashboards {
            match dashboards.snapshot(Role::Admin, None).await {
                Ok(snapshot) => self.hub.publish(DomainEvent::for_dashboard(
                    snapshot,
                    DashboardAudience::Admins,
                    actor,
                )),
                Err(err) => warn!(error = %err, "admin dashboard refresh failed"),
            }
        }
        if action.ends_sessions() && self.hub.disconnect_user(subject.id()).is_err() {
            warn!(user_id = %subject.id(), "realtime hub stopped, sessions not closed");
        }
    }
}
