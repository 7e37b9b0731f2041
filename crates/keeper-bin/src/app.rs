//! Foreground keeper loop.

use crate::signals::SignalListener;
use keeper_config_and_utils::{Config, CoreError, CoreResult};
use session_refresh::{AuthEventKind, AuthProvider, HostSignals, RefreshCoordinator};
use std::sync::Arc;
use supabase_auth::SupabaseAuthProvider;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Check the parts of the configuration a run depends on.
fn validate_for_run(config: &Config) -> CoreResult<()> {
    config.supabase_url()?;
    if config.supabase_publishable_key.trim().is_empty() {
        return Err(CoreError::Config(
            "Supabase publishable key is not set (SESSION_KEEPER_SUPABASE_PUBLISHABLE_KEY)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Sign in, then keep the session fresh until Ctrl-C or sign-out.
pub async fn run_keeper(config: Config, email: &str, password: &str) -> CoreResult<()> {
    let refresh_config = config.refresh_config()?;
    validate_for_run(&config)?;

    info!(
        supabase_url = %config.supabase_url,
        refresh_threshold_secs = config.refresh_threshold_secs,
        check_interval_secs = config.check_interval_secs,
        "Session keeper starting"
    );

    let provider = Arc::new(SupabaseAuthProvider::new(
        &config.supabase_url,
        config.supabase_publishable_key.trim(),
    )?);

    let session = provider.sign_in_with_password(email, password).await?;
    info!(
        user_id = %session.user_id,
        expires_at = session.expires_at,
        "Signed in"
    );

    let mut auth_events = provider.subscribe();
    let host = HostSignals::new();
    let mut signals = SignalListener::install()?;
    let mut signals_open = true;

    let handle = RefreshCoordinator::new(provider.clone(), host.clone())
        .with_config(refresh_config)
        .on_notice(Box::new(|notice| {
            warn!(kind = ?notice.kind, "{}", notice.message);
            eprintln!("{}", notice.message);
        }))
        .on_state_change(Box::new(|state| {
            debug!(state = ?state, "Refresh state changed");
        }))
        .start()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received shutdown signal, exiting...");
                break;
            }
            signal = signals.next(), if signals_open => match signal {
                Some(signal) => {
                    info!(signal = signal.as_str(), "Forwarding host signal");
                    host.notify(signal);
                }
                None => {
                    warn!("Signal stream closed");
                    signals_open = false;
                }
            },
            event = auth_events.recv() => match event {
                Ok(event) if event.kind == AuthEventKind::SignedOut => {
                    warn!("Session ended, sign in again to continue");
                    break;
                }
                Ok(event) => debug!(kind = ?event.kind, "Auth event"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Missed auth events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.stop().await;
    info!("Session keeper stopped");

    Ok(())
}
