//! Connection authentication outcomes.

use super::helpers::{Stack, next_close, stack};
use rstest::rstest;
use taskhub::{
    identity::{domain::Role, ports::AuthError},
    realtime::{
        domain::ConnectionState,
        services::GatewayError,
    },
};

#[rstest]
#[case(None)]
#[case(Some("not-a-token"))]
#[tokio::test(flavor = "multi_thread")]
async fn bad_credentials_close_the_socket(
    stack: Stack,
    #[case] credential: Option<&str>,
) -> eyre::Result<()> {
    let (result, mut frames) = stack.handshake(credential).await;

    eyre::ensure!(matches!(result, Err(GatewayError::Auth(_))));
    next_close(&mut frames).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_credential_is_reported_as_such(stack: Stack) {
    let (result, _frames) = stack.handshake(None).await;

    assert!(matches!(
        result,
        Err(GatewayError::Auth(AuthError::MissingCredential))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disconnect_ends_delivery(stack: Stack) -> eyre::Result<()> {
    let mut m1 = stack.connect("m1", Role::Manager).await?;
    let mut observer = stack.connect("observer", Role::Admin).await?;

    stack.gateway.disconnect(&mut m1.session)?;
    stack.settle(&mut [&mut observer]).await?;

    eyre::ensure!(m1.session.state() == ConnectionState::Disconnected);
    // The marker broadcast was queued after the unregister, so the closed
    // session must not have received it.
    eyre::ensure!(m1.frames.try_recv().is_err());
    Ok(())
}
