//! Shared wiring for end-to-end realtime tests.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use taskhub::{
    config::TaskhubConfig,
    identity::{
        adapters::memory::{InMemoryUserDirectory, StaticCredentialVerifier},
        domain::{Actor, Role, UserId, UserSummary},
    },
    realtime::{
        adapters::{ChannelSink, SocketFrame},
        domain::UserAction,
        services::{
            ConnectionGateway, ConnectionSession, GatewayError, RealtimeHub,
            UserEventPublisher, hub_channel,
        },
    },
    task::{adapters::memory::InMemoryTaskRepository, services::TaskLifecycleService},
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Service type wired over the in-memory adapters.
pub type StackService =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryUserDirectory, DefaultClock>;

/// Longest wait for a frame before a test gives up.
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// A fully wired process: stores, hub, gateway and services.
pub struct Stack {
    pub users: Arc<InMemoryUserDirectory>,
    pub verifier: Arc<StaticCredentialVerifier>,
    pub gateway: ConnectionGateway<StaticCredentialVerifier>,
    pub tasks: StackService,
    pub user_events: UserEventPublisher<DefaultClock>,
}

/// A connected client and the frames its socket receives.
pub struct Client {
    pub user: UserSummary,
    pub session: ConnectionSession,
    pub frames: UnboundedReceiver<SocketFrame>,
}

impl Client {
    /// Returns the acting view of the client's identity.
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.user.as_actor()
    }
}

/// Starts the hub on the current runtime and wires every service to it.
#[fixture]
pub fn stack() -> Stack {
    let config = TaskhubConfig::default();
    let users = Arc::new(InMemoryUserDirectory::new());
    let verifier = Arc::new(StaticCredentialVerifier::new());
    let clock = Arc::new(DefaultClock);
    let (hub, commands) = hub_channel();
    tokio::spawn(RealtimeHub::new(Arc::clone(&clock)).run(commands));

    Stack {
        gateway: ConnectionGateway::new(Arc::clone(&verifier), hub.clone(), &config),
        tasks: TaskLifecycleService::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::clone(&users),
            Arc::clone(&clock),
            hub.clone(),
        )
        .with_config(config),
        user_events: UserEventPublisher::new(hub, clock),
        users,
        verifier,
    }
}

impl Stack {
    /// Adds a user to the directory and issues a token for them.
    pub fn enrol(&self, name: &str, role: Role) -> eyre::Result<UserSummary> {
        let user = UserSummary::new(UserId::new(), format!("{name}@example.test"), name, role);
        self.users.upsert(user.clone())?;
        self.verifier.issue(format!("token-{name}"), user.clone())?;
        Ok(user)
    }

    /// Enrols a user, connects them and waits for the confirmation frame.
    pub async fn connect(&self, name: &str, role: Role) -> eyre::Result<Client> {
        let user = self.enrol(name, role)?;
        let (sink, mut frames) = ChannelSink::channel();
        let session = self
            .gateway
            .accept(Arc::new(sink), async move { Some(format!("token-{name}")) })
            .await?;
        let confirmation = next_frame(&mut frames).await?;
        eyre::ensure!(confirmation["eventType"] == "CONNECTED");
        Ok(Client {
            user,
            session,
            frames,
        })
    }

    /// Attempts a handshake with an arbitrary credential.
    pub async fn handshake(
        &self,
        credential: Option<&str>,
    ) -> (
        Result<ConnectionSession, GatewayError>,
        UnboundedReceiver<SocketFrame>,
    ) {
        let (sink, frames) = ChannelSink::channel();
        let presented = credential.map(str::to_owned);
        let result = self
            .gateway
            .accept(Arc::new(sink), async move { presented })
            .await;
        (result, frames)
    }

    /// Waits until the hub has processed everything queued so far and
    /// returns the event types each client received in the meantime.
    ///
    /// A marker user event is broadcast; since the hub handles commands in
    /// order, every earlier frame reaches a client before the marker does.
    pub async fn settle(&self, clients: &mut [&mut Client]) -> eyre::Result<Vec<Vec<String>>> {
        let marker = UserSummary::new(UserId::new(), "marker@example.test", "marker", Role::Admin);
        self.user_events
            .publish_user_event(UserAction::Login, &marker, &marker.as_actor())
            .await;
        let mut received = Vec::with_capacity(clients.len());
        for client in clients.iter_mut() {
            let mut kinds = Vec::new();
            loop {
                let frame = next_frame(&mut client.frames).await?;
                let is_marker = frame["eventType"] == "USER_EVENT"
                    && frame["data"]["userId"] == marker.id().to_string().as_str();
                if is_marker {
                    break;
                }
                kinds.push(frame["eventType"].as_str().unwrap_or_default().to_owned());
            }
            received.push(kinds);
        }
        Ok(received)
    }
}

/// Waits for the next text frame and parses it.
pub async fn next_frame(frames: &mut UnboundedReceiver<SocketFrame>) -> eyre::Result<Value> {
    match tokio::time::timeout(FRAME_TIMEOUT, frames.recv()).await? {
        Some(SocketFrame::Text(text)) => Ok(serde_json::from_str(&text)?),
        Some(SocketFrame::Close) => eyre::bail!("socket closed"),
        None => eyre::bail!("socket dropped"),
    }
}

/// Waits for a close request on the socket, skipping text frames.
pub async fn next_close(frames: &mut UnboundedReceiver<SocketFrame>) -> eyre::Result<()> {
    loop {
        match tokio::time::timeout(FRAME_TIMEOUT, frames.recv()).await? {
            Some(SocketFrame::Close) => return Ok(()),
            Some(SocketFrame::Text(_)) => {}
            None => eyre::bail!("socket dropped without a close request"),
        }
    }
}
