//! Shared world state for manager-scoped delivery scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use taskhub::{
    identity::{
        adapters::memory::{InMemoryUserDirectory, StaticCredentialVerifier},
        domain::{Actor, Role, UserId, UserSummary},
    },
    realtime::{
        adapters::{ChannelSink, SocketFrame},
        domain::UserAction,
        services::{
            ConnectionGateway, HubCommand, RealtimeHub, UserEventPublisher, hub_channel,
        },
    },
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::Task,
        services::{TaskLifecycleError, TaskLifecycleService},
    },
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Service type used by the BDD world.
pub type ScopeTaskService =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryUserDirectory, DefaultClock>;

const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// A connected scenario participant.
pub struct Participant {
    pub actor: Actor,
    pub frames: UnboundedReceiver<SocketFrame>,
}

/// Scenario world for manager-scoped delivery.
pub struct ScopeWorld {
    pub users: Arc<InMemoryUserDirectory>,
    pub verifier: Arc<StaticCredentialVerifier>,
    pub gateway: ConnectionGateway<StaticCredentialVerifier>,
    pub tasks: ScopeTaskService,
    pub user_events: UserEventPublisher<DefaultClock>,
    pub hub_commands: Option<UnboundedReceiver<HubCommand>>,
    pub participants: HashMap<String, Participant>,
    pub last_task: Option<Task>,
    pub last_update: Option<Result<Task, TaskLifecycleError>>,
    received: Option<HashMap<String, Vec<String>>>,
}

impl ScopeWorld {
    /// Creates a world whose hub has not been started yet.
    #[must_use]
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserDirectory::new());
        let verifier = Arc::new(StaticCredentialVerifier::new());
        let clock = Arc::new(DefaultClock);
        let (hub, commands) = hub_channel();
        Self {
            gateway: ConnectionGateway::new(
                Arc::clone(&verifier),
                hub.clone(),
                &taskhub::config::TaskhubConfig::default(),
            ),
            tasks: TaskLifecycleService::new(
                Arc::new(InMemoryTaskRepository::new()),
                Arc::clone(&users),
                Arc::clone(&clock),
                hub.clone(),
            ),
            user_events: UserEventPublisher::new(hub, clock),
            hub_commands: Some(commands),
            users,
            verifier,
            participants: HashMap::new(),
            last_task: None,
            last_update: None,
            received: None,
        }
    }

    /// Spawns the hub on the current runtime.
    pub fn start_hub(&mut self) -> Result<(), eyre::Report> {
        let commands = self
            .hub_commands
            .take()
            .ok_or_else(|| eyre::eyre!("hub already started"))?;
        tokio::spawn(RealtimeHub::new(Arc::new(DefaultClock)).run(commands));
        Ok(())
    }

    /// Enrols and connects a participant, waiting for the confirmation.
    pub async fn connect(&mut self, name: &str, role: Role) -> Result<(), eyre::Report> {
        let user = UserSummary::new(UserId::new(), format!("{name}@example.test"), name, role);
        self.users.upsert(user.clone())?;
        let token = format!("token-{name}");
        self.verifier.issue(token.clone(), user.clone())?;
        let (sink, mut frames) = ChannelSink::channel();
        self.gateway
            .accept(Arc::new(sink), async move { Some(token) })
            .await?;
        let confirmation = next_frame(&mut frames).await?;
        if confirmation["eventType"] != "CONNECTED" {
            return Err(eyre::eyre!("expected a confirmation, got {confirmation}"));
        }
        self.participants.insert(
            name.to_owned(),
            Participant {
                actor: user.as_actor(),
                frames,
            },
        );
        Ok(())
    }

    /// Returns the acting identity of a participant.
    pub fn actor(&self, name: &str) -> Result<Actor, eyre::Report> {
        self.participants
            .get(name)
            .map(|participant| participant.actor.clone())
            .ok_or_else(|| eyre::eyre!("unknown participant {name}"))
    }

    /// Forgets frames gathered so far; the next query drains afresh.
    pub fn forget_received(&mut self) {
        self.received = None;
    }

    /// Returns the event types a participant received since the last
    /// [`Self::forget_received`].
    pub async fn received_by(&mut self, name: &str) -> Result<Vec<String>, eyre::Report> {
        if self.received.is_none() {
            self.received = Some(self.drain().await?);
        }
        self.received
            .as_ref()
            .and_then(|received| received.get(name))
            .cloned()
            .ok_or_else(|| eyre::eyre!("unknown participant {name}"))
    }

    /// Broadcasts a marker and collects every frame each participant got
    /// before it. The hub handles commands in order, so the marker arrives
    /// last.
    async fn drain(&mut self) -> Result<HashMap<String, Vec<String>>, eyre::Report> {
        let marker = UserSummary::new(UserId::new(), "marker@example.test", "marker", Role::Admin);
        self.user_events
            .publish_user_event(UserAction::Login, &marker, &marker.as_actor())
            .await;
        let marker_id = marker.id().to_string();
        let mut received = HashMap::new();
        for (name, participant) in &mut self.participants {
            let mut kinds = Vec::new();
            loop {
                let frame = next_frame(&mut participant.frames).await?;
                if frame["data"]["userId"] == marker_id.as_str() {
                    break;
                }
                kinds.push(frame["eventType"].as_str().unwrap_or_default().to_owned());
            }
            received.insert(name.clone(), kinds);
        }
        Ok(received)
    }
}

impl Default for ScopeWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ScopeWorld {
    ScopeWorld::default()
}

async fn next_frame(frames: &mut UnboundedReceiver<SocketFrame>) -> Result<Value, eyre::Report> {
    match tokio::time::timeout(FRAME_TIMEOUT, frames.recv()).await? {
        Some(SocketFrame::Text(text)) => Ok(serde_json::from_str(&text)?),
        Some(SocketFrame::Close) => Err(eyre::eyre!("socket closed")),
        None => Err(eyre::eyre!("socket dropped")),
    }
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
