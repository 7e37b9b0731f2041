//! Proactive session refresh coordinator.
//!
//! A single tokio task owns all scheduling state and multiplexes every input
//! with `tokio::select!`:
//!
//! ```text
//!  provider events ──┐
//!  host signals ─────┤                     ┌──► one-shot timer (≤ 1 armed)
//!  periodic tick ────┼──► coordinator ─────┤
//!  refresh_token() ──┤      task           └──► refresh task   (≤ 1 in flight)
//!  stop() ───────────┘
//! ```
//!
//! Every path that wants a refresh goes through the same single-flight
//! guard. A successful refresh does not re-arm the timer itself; the
//! provider's `TokenRefreshed` event does.

use crate::refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshState};
use crate::{
    AuthError, AuthEvent, AuthEventKind, AuthProvider, AuthResult, Clock, FailureClass,
    HostSignal, HostSignals, NoticeCallback, RefreshConfig, Session, SystemClock, UserNotice,
};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior, Sleep};
use tracing::{debug, error, info, warn};

const COMMAND_CAPACITY: usize = 8;

/// Callback type for refresh state change notifications.
pub type StateCallback = Box<dyn Fn(RefreshState) + Send + Sync>;

enum Command {
    RefreshNow {
        reply: oneshot::Sender<AuthResult<Session>>,
    },
}

/// Builder for a session refresh coordinator.
///
/// The provider is injected explicitly; nothing is read from global state.
pub struct RefreshCoordinator {
    provider: Arc<dyn AuthProvider>,
    host: HostSignals,
    config: RefreshConfig,
    clock: Arc<dyn Clock>,
    notice_callback: Option<NoticeCallback>,
    state_callback: Option<StateCallback>,
}

impl RefreshCoordinator {
    /// Create a coordinator with the default refresh policy.
    pub fn new(provider: Arc<dyn AuthProvider>, host: HostSignals) -> Self {
        Self {
            provider,
            host,
            config: RefreshConfig::default(),
            clock: Arc::new(SystemClock),
            notice_callback: None,
            state_callback: None,
        }
    }

    /// Use a custom refresh policy.
    pub fn with_config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set a callback for user-visible notices (e.g. "session expired").
    pub fn on_notice(mut self, callback: NoticeCallback) -> Self {
        self.notice_callback = Some(callback);
        self
    }

    /// Set a callback to be notified of refresh state changes.
    pub fn on_state_change(mut self, callback: StateCallback) -> Self {
        self.state_callback = Some(callback);
        self
    }

    /// Start coordinating.
    ///
    /// Subscribes to provider events and host signals, performs one check
    /// immediately and arms the periodic safety check. Must be called from
    /// within a tokio runtime. Everything acquired here is released when the
    /// returned handle is stopped or dropped.
    ///
    /// Fails with [`AuthError::Config`] when a timing value is zero.
    pub fn start(self) -> AuthResult<RefreshHandle> {
        self.config.ensure_runnable()?;

        let auth_events = self.provider.subscribe();
        let host_signals = self.host.subscribe();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(RefreshState::Idle);
        let stopped = Arc::new(AtomicBool::new(false));

        info!(
            refresh_threshold_secs = self.config.refresh_threshold.as_secs(),
            check_interval_secs = self.config.check_interval.as_secs(),
            "Starting session refresh coordinator"
        );

        let worker = Worker {
            provider: self.provider,
            config: self.config,
            clock: self.clock,
            notice_callback: self.notice_callback,
            state_callback: self.state_callback,
            state_tx,
            stopped: stopped.clone(),
            machine: RefreshMachine::new(),
            pending: None,
            in_flight: None,
            waiters: Vec::new(),
            consecutive_failures: 0,
        };

        let task = tokio::spawn(worker.run(auth_events, host_signals, command_rx, shutdown_rx));

        Ok(RefreshHandle {
            commands: command_tx,
            shutdown_tx: Some(shutdown_tx),
            stopped,
            state_rx,
            task: Some(task),
        })
    }
}

/// Handle to a running coordinator.
///
/// Dropping the handle without calling [`RefreshHandle::stop`] aborts the
/// coordinator task.
pub struct RefreshHandle {
    commands: mpsc::Sender<Command>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    stopped: Arc<AtomicBool>,
    state_rx: watch::Receiver<RefreshState>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Refresh the session now (e.g. a user-initiated retry).
    ///
    /// If a refresh is already in flight no second one is started; the
    /// caller receives the outcome of the outstanding refresh.
    pub async fn refresh_token(&self) -> AuthResult<Session> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(AuthError::CoordinatorStopped);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::RefreshNow { reply: reply_tx })
            .await
            .map_err(|_| AuthError::CoordinatorStopped)?;

        reply_rx.await.map_err(|_| AuthError::CoordinatorStopped)?
    }

    /// Current refresh state.
    pub fn state(&self) -> RefreshState {
        *self.state_rx.borrow()
    }

    /// Watch refresh state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<RefreshState> {
        self.state_rx.clone()
    }

    /// Returns true until `stop` has been called.
    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Stop coordinating.
    ///
    /// Cancels both timers, aborts an in-flight refresh and drops the event
    /// subscriptions. No refresh is attempted after this returns.
    pub async fn stop(mut self) {
        self.stopped.store(true, Ordering::SeqCst);

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Session refresh coordinator task failed");
                }
            }
        }

        info!("Session refresh coordinator stopped");
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.stopped.store(true, Ordering::SeqCst);
            task.abort();
        }
    }
}

/// The outstanding provider refresh. Aborted when dropped.
struct InFlightRefresh {
    task: JoinHandle<AuthResult<Session>>,
}

impl InFlightRefresh {
    async fn join(&mut self) -> AuthResult<Session> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(AuthError::Provider(
                "refresh task panicked".to_string(),
            )),
            Err(e) => Err(AuthError::Provider(format!("refresh task ended: {}", e))),
        }
    }
}

impl Drop for InFlightRefresh {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Worker {
    provider: Arc<dyn AuthProvider>,
    config: RefreshConfig,
    clock: Arc<dyn Clock>,
    notice_callback: Option<NoticeCallback>,
    state_callback: Option<StateCallback>,
    state_tx: watch::Sender<RefreshState>,
    stopped: Arc<AtomicBool>,
    machine: RefreshMachine,
    /// One-shot timer for the next scheduled refresh.
    pending: Option<Pin<Box<Sleep>>>,
    in_flight: Option<InFlightRefresh>,
    /// Manual callers waiting on the in-flight refresh.
    waiters: Vec<oneshot::Sender<AuthResult<Session>>>,
    consecutive_failures: u32,
}

impl Worker {
    async fn run(
        mut self,
        mut auth_events: broadcast::Receiver<AuthEvent>,
        mut host_signals: broadcast::Receiver<HostSignal>,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let period = self.config.check_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut auth_events_open = true;
        let mut host_signals_open = true;

        self.check_and_refresh("startup").await;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    debug!("Session refresh coordinator shutting down");
                    break;
                }
                result = wait_for_refresh(&mut self.in_flight) => {
                    self.on_refresh_settled(result).await;
                }
                _ = wait_for_timer(&mut self.pending) => {
                    self.on_timer_fired();
                }
                _ = ticker.tick() => {
                    self.check_and_refresh("periodic").await;
                }
                received = auth_events.recv(), if auth_events_open => match received {
                    Ok(event) => self.on_auth_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed auth events, re-checking session");
                        self.check_and_refresh("auth_events_lagged").await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Auth event stream closed");
                        auth_events_open = false;
                    }
                },
                received = host_signals.recv(), if host_signals_open => match received {
                    Ok(signal) => self.on_host_signal(signal).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Missed host signals, re-checking session");
                        self.check_and_refresh("host_signals_lagged").await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Host signal stream closed");
                        host_signals_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::RefreshNow { reply }) => self.on_refresh_requested(reply),
                    None => break,
                },
            }
        }

        self.teardown();
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Read the current session and either refresh it now or schedule it.
    async fn check_and_refresh(&mut self, trigger: &'static str) {
        if self.is_stopped() {
            return;
        }

        let session = match self.provider.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(trigger, "No session, nothing to refresh");
                return;
            }
            Err(error) => {
                warn!(trigger, error = %error, "Failed to read current session");
                return;
            }
        };

        let remaining_ms = session.millis_until_expiry(self.clock.now());
        if remaining_ms < self.config.threshold_millis() {
            info!(
                trigger,
                remaining_secs = remaining_ms / 1000,
                "Session inside refresh threshold"
            );
            self.refresh_now(trigger);
        } else {
            self.schedule_refresh(&session, trigger);
        }
    }

    /// Arm the one-shot timer for the session's expiry, replacing any pending one.
    fn schedule_refresh(&mut self, session: &Session, trigger: &'static str) {
        let now = self.clock.now();
        let expires_at = session.expires_at;
        let remaining_ms = session.millis_until_expiry(now);
        let delay_ms = remaining_ms.saturating_sub(self.config.threshold_millis());

        if delay_ms > 0 {
            let delay = Duration::from_millis(delay_ms.unsigned_abs());
            // Replaces any pending timer
            self.pending = Some(Box::pin(tokio::time::sleep(delay)));
            self.transition(&RefreshMachineInput::Arm);
            debug!(
                trigger,
                expires_at,
                delay_secs = delay.as_secs(),
                "Refresh scheduled"
            );
            return;
        }

        self.cancel_pending();
        if !session.is_expired_at(now) {
            info!(trigger, expires_at, "Refresh threshold already breached");
            self.refresh_now(trigger);
        } else {
            debug!(
                trigger,
                expires_at, "Session already expired, waiting for next check"
            );
        }
    }

    fn cancel_pending(&mut self) -> bool {
        if self.pending.take().is_some() {
            self.transition(&RefreshMachineInput::Disarm);
            true
        } else {
            false
        }
    }

    /// Start a refresh unless one is already outstanding.
    fn refresh_now(&mut self, trigger: &'static str) -> bool {
        if self.is_stopped() {
            debug!(trigger, "Coordinator stopped, not refreshing");
            return false;
        }
        if self.in_flight.is_some() {
            debug!(trigger, "Refresh already in flight");
            return false;
        }

        let provider = Arc::clone(&self.provider);
        let task = tokio::spawn(async move { provider.refresh_session().await });
        self.in_flight = Some(InFlightRefresh { task });
        self.transition(&RefreshMachineInput::BeginRefresh);

        info!(trigger, "Refreshing session");
        true
    }

    async fn on_refresh_settled(&mut self, result: AuthResult<Session>) {
        self.in_flight = None;

        match &result {
            Ok(session) => {
                self.consecutive_failures = 0;
                info!(
                    user_id = %session.user_id,
                    expires_at = session.expires_at,
                    "Session refreshed"
                );
            }
            Err(error) => match error.classify() {
                FailureClass::Terminal => {
                    self.consecutive_failures = 0;
                    warn!(error = %error, "Session can no longer be refreshed, signing out");
                    self.cancel_pending();
                    self.notify(UserNotice::session_expired());
                    if let Err(sign_out_error) = self.provider.sign_out().await {
                        warn!(error = %sign_out_error, "Forced sign-out failed");
                    }
                }
                FailureClass::Transient => {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    if self.consecutive_failures >= self.config.failure_alert_after {
                        error!(
                            error = %error,
                            consecutive_failures = self.consecutive_failures,
                            "Session refresh keeps failing"
                        );
                    } else {
                        warn!(
                            error = %error,
                            consecutive_failures = self.consecutive_failures,
                            "Session refresh failed, will retry on next check"
                        );
                    }
                }
            },
        }

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }

        let settle = if self.pending.is_some() {
            RefreshMachineInput::SettleArmed
        } else {
            RefreshMachineInput::SettleIdle
        };
        self.transition(&settle);
    }

    fn on_timer_fired(&mut self) {
        self.pending = None;
        self.transition(&RefreshMachineInput::Disarm);
        debug!("Refresh timer fired");
        self.refresh_now("scheduled");
    }

    fn on_auth_event(&mut self, event: AuthEvent) {
        match event.kind {
            kind @ (AuthEventKind::SignedIn | AuthEventKind::TokenRefreshed) => {
                match event.session {
                    Some(session) => self.schedule_refresh(&session, "auth_event"),
                    None => debug!(kind = ?kind, "Auth event without session"),
                }
            }
            AuthEventKind::SignedOut => {
                let cancelled = self.cancel_pending();
                info!(cancelled_timer = cancelled, "Signed out, refresh idle");
            }
            other => debug!(kind = ?other, "Ignoring auth event"),
        }
    }

    async fn on_host_signal(&mut self, signal: HostSignal) {
        if signal.warrants_check() {
            debug!(signal = signal.as_str(), "Re-checking session after host signal");
            self.check_and_refresh(signal.as_str()).await;
        } else {
            debug!(signal = signal.as_str(), "Ignoring host signal");
        }
    }

    fn on_refresh_requested(&mut self, reply: oneshot::Sender<AuthResult<Session>>) {
        if self.in_flight.is_some() || self.refresh_now("manual") {
            self.waiters.push(reply);
        } else {
            let _ = reply.send(Err(AuthError::CoordinatorStopped));
        }
    }

    fn notify(&self, notice: UserNotice) {
        info!(kind = ?notice.kind, message = %notice.message, "Raising user notice");
        if let Some(callback) = self.notice_callback.as_ref() {
            callback(notice);
        }
    }

    /// Transition the FSM and publish the new state if it changed.
    fn transition(&mut self, input: &RefreshMachineInput) {
        let old_state = RefreshState::from(self.machine.state());

        if self.machine.consume(input).is_err() {
            warn!(
                input = ?input,
                state = ?old_state,
                "Invalid refresh state transition"
            );
            return;
        }

        let new_state = RefreshState::from(self.machine.state());
        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Refresh state transition"
            );
            self.state_tx.send_replace(new_state);
            if let Some(callback) = self.state_callback.as_ref() {
                callback(new_state);
            }
        }
    }

    fn teardown(&mut self) {
        self.pending = None;
        if self.in_flight.take().is_some() {
            debug!("Aborted in-flight refresh");
        }
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(AuthError::CoordinatorStopped));
        }
    }
}

async fn wait_for_refresh(slot: &mut Option<InFlightRefresh>) -> AuthResult<Session> {
    match slot.as_mut() {
        Some(refresh) => refresh.join().await,
        None => std::future::pending().await,
    }
}

async fn wait_for_timer(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
