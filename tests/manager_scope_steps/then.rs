//! Then steps for manager-scoped delivery scenarios.

use super::world::{ScopeWorld, run_async};
use rstest_bdd_macros::then;
use taskhub::task::services::TaskLifecycleError;

#[then(r#""{name}" receives a "{event_type}" event"#)]
fn receives_event(
    world: &mut ScopeWorld,
    name: String,
    event_type: String,
) -> Result<(), eyre::Report> {
    let received = run_async(world.received_by(&name))?;
    if !received.contains(&event_type) {
        return Err(eyre::eyre!("{name} expected {event_type}, got {received:?}"));
    }
    Ok(())
}

#[then(r#""{name}" receives no task events"#)]
fn receives_no_task_events(world: &mut ScopeWorld, name: String) -> Result<(), eyre::Report> {
    let received = run_async(world.received_by(&name))?;
    if received.iter().any(|kind| kind.starts_with("TASK_")) {
        return Err(eyre::eyre!("{name} should see no task events, got {received:?}"));
    }
    Ok(())
}

#[then("the update succeeds")]
fn update_succeeds(world: &ScopeWorld) -> Result<(), eyre::Report> {
    match world.last_update.as_ref() {
        Some(Ok(_)) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("expected the update to succeed: {err}")),
        None => Err(eyre::eyre!("missing update result")),
    }
}

#[then("the update is rejected as forbidden")]
fn update_forbidden(world: &ScopeWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_update
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing update result"))?;
    if !matches!(result, Err(TaskLifecycleError::Forbidden(_))) {
        return Err(eyre::eyre!("expected a Forbidden error, got {result:?}"));
    }
    Ok(())
}
