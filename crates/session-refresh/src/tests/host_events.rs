//! Reactions to visibility and connectivity signals.

use super::harness::{settle, TestHarness};
use crate::{HostSignal, RefreshState};

#[tokio::test(start_paused = true)]
async fn becoming_visible_rechecks_session() {
    let harness = TestHarness::without_periodic_check();

    let handle = harness.start();
    settle().await;

    // Timer was throttled while hidden; the session is now inside the window
    harness.seed_session(200);

    harness.host.notify(HostSignal::BecameHidden);
    settle().await;
    assert_eq!(harness.provider.refresh_calls(), 0);

    harness.host.notify(HostSignal::BecameVisible);
    settle().await;
    assert_eq!(harness.provider.refresh_calls(), 1);
    assert_eq!(handle.state(), RefreshState::Scheduled);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn coming_online_rechecks_session() {
    let harness = TestHarness::without_periodic_check();

    let handle = harness.start();
    settle().await;

    harness.seed_session(120);

    harness.host.notify(HostSignal::Offline);
    settle().await;
    assert_eq!(harness.provider.refresh_calls(), 0);

    harness.host.notify(HostSignal::Online);
    settle().await;
    assert_eq!(harness.provider.refresh_calls(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn visible_with_healthy_session_only_schedules() {
    let harness = TestHarness::without_periodic_check();

    let handle = harness.start();
    settle().await;

    harness.seed_session(3600);
    harness.host.notify(HostSignal::BecameVisible);
    settle().await;

    assert_eq!(harness.provider.refresh_calls(), 0);
    assert_eq!(handle.state(), RefreshState::Scheduled);

    handle.stop().await;
}
