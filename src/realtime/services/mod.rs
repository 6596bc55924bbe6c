//! Realtime services: registry bookkeeping, routing, delivery and the hub
//! actor that ties them together.

mod broadcaster;
mod gateway;
mod hub;
mod registry;
mod router;
mod user_events;

pub use broadcaster::{BroadcastError, DeliveryReport, EventBroadcaster};
pub use gateway::{ConnectionGateway, ConnectionSession, GatewayError};
pub use hub::{HubClosed, HubCommand, HubHandle, RealtimeHub, hub_channel};
pub use registry::{ConnectionRegistry, Registration, RegistryError};
pub use router::{RoomRouter, RoutingError};
pub use user_events::UserEventPublisher;
