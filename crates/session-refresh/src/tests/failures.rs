//! Terminal vs. transient refresh failures.

use super::harness::{advance_secs, settle, RefreshBehavior, TestHarness};
use crate::{AuthError, NoticeKind, RefreshState};

#[tokio::test(start_paused = true)]
async fn invalid_session_signs_out_once_and_notifies() {
    let harness = TestHarness::new();
    harness.seed_session(200);
    harness.provider.queue(RefreshBehavior::Fail(AuthError::SessionInvalid(
        "refresh_token_not_found".to_string(),
    )));

    let handle = harness.start();
    settle().await;

    assert_eq!(harness.provider.refresh_calls(), 1);
    assert_eq!(harness.provider.sign_out_calls(), 1);
    assert!(harness.provider.stored_session().is_none());

    let notices = harness.recorder.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::SessionExpired);
    assert_eq!(handle.state(), RefreshState::Idle);

    // Nothing left to refresh
    advance_secs(120).await;
    assert_eq!(harness.provider.refresh_calls(), 1);
    assert_eq!(harness.provider.sign_out_calls(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn untyped_expired_message_is_terminal() {
    let harness = TestHarness::without_periodic_check();
    harness.seed_session(200);
    harness.provider.queue(RefreshBehavior::Fail(AuthError::TokenRefresh(
        "Refresh Token Expired".to_string(),
    )));

    let handle = harness.start();
    settle().await;

    assert_eq!(harness.provider.sign_out_calls(), 1);
    assert_eq!(harness.recorder.notices().len(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn network_failure_is_retried_by_periodic_check() {
    let harness = TestHarness::new();
    let seeded = harness.seed_session(200);
    harness
        .provider
        .queue(RefreshBehavior::Fail(AuthError::NetworkUnavailable));

    let handle = harness.start();
    settle().await;

    assert_eq!(harness.provider.refresh_calls(), 1);
    assert_eq!(harness.provider.sign_out_calls(), 0);
    assert!(harness.recorder.notices().is_empty());
    assert_eq!(harness.provider.stored_session(), Some(seeded));
    assert_eq!(handle.state(), RefreshState::Idle);

    advance_secs(30).await;
    assert_eq!(harness.provider.refresh_calls(), 2);
    assert_eq!(harness.provider.sign_out_calls(), 0);
    assert_eq!(handle.state(), RefreshState::Scheduled);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unclassified_failure_never_signs_out() {
    let harness = TestHarness::new();
    harness.seed_session(200);
    for _ in 0..6 {
        harness
            .provider
            .queue(RefreshBehavior::Fail(AuthError::Provider(
                "unexpected response".to_string(),
            )));
    }

    let handle = harness.start();
    advance_secs(155).await;

    // Startup plus five periodic retries
    assert_eq!(harness.provider.refresh_calls(), 6);
    assert_eq!(harness.provider.sign_out_calls(), 0);
    assert!(harness.recorder.notices().is_empty());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_surfaces_failure() {
    let harness = TestHarness::without_periodic_check();
    harness.seed_session(400);
    harness.provider.queue(RefreshBehavior::Fail(AuthError::Server {
        status: 503,
        message: "unavailable".to_string(),
    }));

    let handle = harness.start();
    settle().await;

    let result = handle.refresh_token().await;
    assert!(matches!(result, Err(AuthError::Server { status: 503, .. })));
    assert_eq!(harness.provider.sign_out_calls(), 0);

    // The armed timer survives a transient failure
    assert_eq!(handle.state(), RefreshState::Scheduled);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn provider_panic_is_contained() {
    let harness = TestHarness::new();
    harness.seed_session(200);
    harness.provider.queue(RefreshBehavior::Panic);

    let handle = harness.start();
    settle().await;

    assert_eq!(harness.provider.refresh_calls(), 1);
    assert_eq!(harness.provider.sign_out_calls(), 0);
    assert!(handle.is_running());

    advance_secs(30).await;
    assert_eq!(harness.provider.refresh_calls(), 2);
    assert_eq!(handle.state(), RefreshState::Scheduled);

    handle.stop().await;
}
