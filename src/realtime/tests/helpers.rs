//! Shared fixtures for realtime tests.

use crate::identity::domain::{Actor, Role, UserId};
use crate::identity::ports::VerifiedIdentity;
use crate::realtime::adapters::{ChannelSink, SocketFrame};
use crate::task::domain::{Task, TaskDraft};
use mockable::DefaultClock;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn identity(role: Role) -> VerifiedIdentity {
    let id = UserId::new();
    VerifiedIdentity::new(id, format!("{id}@example.test"), format!("user {id}"), role)
}

pub fn actor_for(identity: &VerifiedIdentity) -> Actor {
    Actor::new(identity.id, identity.name.clone(), identity.role)
}

pub fn sink() -> (Arc<ChannelSink>, UnboundedReceiver<SocketFrame>) {
    let (sink, frames) = ChannelSink::channel();
    (Arc::new(sink), frames)
}

pub fn project_task(manager: UserId, assignee: UserId) -> Task {
    Task::new_project(TaskDraft::new("Ship it"), manager, assignee, &DefaultClock)
        .expect("valid project task")
}

/// Drains every text frame received so far, parsed as JSON.
pub fn drain_frames(frames: &mut UnboundedReceiver<SocketFrame>) -> Vec<Value> {
    let mut parsed = Vec::new();
    while let Ok(frame) = frames.try_recv() {
        if let SocketFrame::Text(text) = frame {
            parsed.push(serde_json::from_str(&text).expect("frames are JSON"));
        }
    }
    parsed
}

/// Returns the `eventType` of every drained frame.
pub fn event_types(frames: &mut UnboundedReceiver<SocketFrame>) -> Vec<String> {
    drain_frames(frames)
        .into_iter()
        .filter_map(|frame| frame["eventType"].as_str().map(str::to_owned))
        .collect()
}
