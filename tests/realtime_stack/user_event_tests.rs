//! User lifecycle events are broadcast and end affected sessions.

use super::helpers::{Stack, next_close, next_frame, stack};
use rstest::rstest;
use taskhub::{
    identity::{
        domain::{Role, UserSummary},
        ports::AuthError,
    },
    realtime::{domain::UserAction, services::GatewayError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn profile_updates_reach_everyone_once(stack: Stack) -> eyre::Result<()> {
    let mut admin = stack.connect("admin", Role::Admin).await?;
    let mut m1 = stack.connect("m1", Role::Manager).await?;
    let mut u1 = stack.connect("u1", Role::Member).await?;

    stack
        .user_events
        .publish_user_event(UserAction::ProfileUpdated, &u1.user, &admin.actor())
        .await;

    for client in [&mut admin, &mut m1] {
        let frame = next_frame(&mut client.frames).await?;
        eyre::ensure!(frame["eventType"] == "USER_EVENT");
        eyre::ensure!(frame["data"]["action"] == "PROFILE_UPDATED");
    }
    // The subject is in both the broadcast room and their own room.
    let own = stack.settle(&mut [&mut u1]).await?;
    eyre::ensure!(own == vec![vec!["USER_EVENT".to_owned()]], "subject saw {own:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivation_closes_the_subjects_sessions(stack: Stack) -> eyre::Result<()> {
    let admin = stack.connect("admin", Role::Admin).await?;
    let mut u1 = stack.connect("u1", Role::Member).await?;
    let deactivated = u1.user.clone().with_active(false);
    stack.users.upsert(deactivated.clone())?;
    stack.verifier.issue("token-u1", deactivated.clone())?;

    stack
        .user_events
        .publish_user_event(UserAction::Deactivated, &deactivated, &admin.actor())
        .await;

    let frame = next_frame(&mut u1.frames).await?;
    eyre::ensure!(frame["data"]["action"] == "DEACTIVATED");
    eyre::ensure!(frame["data"]["active"] == false);
    next_close(&mut u1.frames).await?;

    let (reconnect, _frames) = stack.handshake(Some("token-u1")).await;
    eyre::ensure!(matches!(
        reconnect,
        Err(GatewayError::Auth(AuthError::InactiveIdentity(id))) if id == deactivated.id()
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn role_change_moves_the_user_to_new_rooms_on_reconnect(stack: Stack) -> eyre::Result<()> {
    let admin = stack.connect("admin", Role::Admin).await?;
    let mut promoted = stack.connect("u9", Role::Member).await?;
    let member = &promoted.user;
    let manager = UserSummary::new(member.id(), member.email(), member.name(), Role::Manager);
    stack.users.upsert(manager.clone())?;
    stack.verifier.issue("token-u9", manager.clone())?;

    stack
        .user_events
        .publish_user_event(UserAction::RoleChanged, &manager, &admin.actor())
        .await;
    next_close(&mut promoted.frames).await?;

    let (result, mut frames) = stack.handshake(Some("token-u9")).await;
    let session = result?;
    let confirmation = next_frame(&mut frames).await?;
    eyre::ensure!(confirmation["role"] == "MANAGER");
    eyre::ensure!(session.identity().map(|identity| identity.role) == Some(Role::Manager));
    Ok(())
}
