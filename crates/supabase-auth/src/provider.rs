//! Supabase GoTrue implementation of [`AuthProvider`].

use crate::errors::{refresh_failure, sign_in_failure, transport_failure};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use session_refresh::{AuthError, AuthEvent, AuthEvents, AuthProvider, AuthResult, Session};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Supabase token refresh request.
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Supabase password grant request.
#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response of both token grants.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + self.expires_in);

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at,
        }
    }
}

/// The stored session and a counter bumped on every write, so a refresh can
/// tell whether the session it started from is still current.
#[derive(Debug, Default)]
struct SessionSlot {
    session: Option<Session>,
    generation: u64,
}

impl SessionSlot {
    fn replace(&mut self, session: Option<Session>) -> Option<Session> {
        self.generation = self.generation.wrapping_add(1);
        std::mem::replace(&mut self.session, session)
    }
}

/// Auth provider backed by the Supabase Auth REST API.
///
/// Holds the session in memory only; persisting it is up to the caller
/// (see [`SupabaseAuthProvider::set_session`]).
pub struct SupabaseAuthProvider {
    supabase_url: String,
    publishable_key: String,
    http_client: Client,
    session: Mutex<SessionSlot>,
    events: AuthEvents,
}

impl SupabaseAuthProvider {
    /// Create a provider for the project at `supabase_url`.
    pub fn new(supabase_url: &str, publishable_key: &str) -> AuthResult<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {}", e)))?;
        Self::with_http_client(supabase_url, publishable_key, http_client)
    }

    /// Create a provider using a preconfigured HTTP client.
    pub fn with_http_client(
        supabase_url: &str,
        publishable_key: &str,
        http_client: Client,
    ) -> AuthResult<Self> {
        let parsed = Url::parse(supabase_url)
            .map_err(|e| AuthError::Config(format!("invalid Supabase URL {}: {}", supabase_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuthError::Config(format!(
                "unsupported Supabase URL scheme: {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            publishable_key: publishable_key.to_string(),
            http_client,
            session: Mutex::new(SessionSlot::default()),
            events: AuthEvents::new(),
        })
    }

    /// Login with email and password.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        let login_url = format!("{}/auth/v1/token?grant_type=password", self.supabase_url);

        debug!(url = %login_url, email = %email, "Attempting email/password login");

        let response = self
            .http_client
            .post(&login_url)
            .header("apikey", &self.publishable_key)
            .json(&PasswordRequest { email, password })
            .send()
            .await
            .map_err(transport_failure)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Login failed");
            return Err(sign_in_failure(status.as_u16(), &body));
        }

        let data: TokenResponse = response.json().await.map_err(transport_failure)?;
        let session = data.into_session();

        info!(user_id = %session.user_id, "Login successful");
        self.store(session.clone());
        self.events.emit(AuthEvent::signed_in(session.clone()));

        Ok(session)
    }

    /// Restore a previously obtained session.
    pub fn set_session(&self, session: Session) {
        debug!(user_id = %session.user_id, "Session restored");
        self.store(session.clone());
        self.events.emit(AuthEvent::signed_in(session));
    }

    fn store(&self, session: Session) {
        self.session.lock().replace(Some(session));
    }

    fn snapshot(&self) -> Option<Session> {
        self.session.lock().session.clone()
    }

    /// Store a refreshed session only if nothing replaced or cleared the
    /// session since the refresh started at `generation`.
    fn commit_refresh(&self, generation: u64, session: Session) -> AuthResult<Session> {
        let mut slot = self.session.lock();
        if slot.generation != generation {
            return match slot.session.clone() {
                Some(current) => {
                    debug!("Session replaced during refresh, discarding refreshed tokens");
                    Ok(current)
                }
                None => {
                    debug!("Signed out during refresh, discarding refreshed tokens");
                    Err(AuthError::NotLoggedIn)
                }
            };
        }
        slot.replace(Some(session.clone()));
        // Emitted under the lock so a concurrent sign-out cannot slip in between
        self.events.emit(AuthEvent::token_refreshed(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn current_session(&self) -> AuthResult<Option<Session>> {
        Ok(self.snapshot())
    }

    async fn refresh_session(&self) -> AuthResult<Session> {
        let (current, generation) = {
            let slot = self.session.lock();
            let current = slot.session.clone().ok_or(AuthError::NotLoggedIn)?;
            (current, slot.generation)
        };

        let refresh_url = format!(
            "{}/auth/v1/token?grant_type=refresh_token",
            self.supabase_url
        );

        debug!(url = %refresh_url, "Refreshing token");

        let response = self
            .http_client
            .post(&refresh_url)
            .header("apikey", &self.publishable_key)
            .json(&RefreshRequest {
                refresh_token: &current.refresh_token,
            })
            .send()
            .await
            .map_err(transport_failure)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = refresh_failure(status.as_u16(), &body);
            warn!(status = %status, error = %error, "Token refresh failed");

            // The session is left in place; the caller decides what a failure means
            return Err(error);
        }

        let data: TokenResponse = response.json().await.map_err(transport_failure)?;
        let session = self.commit_refresh(generation, data.into_session())?;

        info!(
            user_id = %session.user_id,
            expires_at = session.expires_at,
            "Token refreshed successfully"
        );

        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let previous = self.session.lock().replace(None);

        if let Some(session) = previous {
            let logout_url = format!("{}/auth/v1/logout", self.supabase_url);

            let result = self
                .http_client
                .post(&logout_url)
                .header("apikey", &self.publishable_key)
                .header("Authorization", format!("Bearer {}", session.access_token))
                .send()
                .await;

            // Server-side revocation is best effort; the local session is gone either way
            match result {
                Ok(response) if response.status().is_success() => {
                    debug!("Session revoked server-side");
                }
                Ok(response) => {
                    warn!(status = %response.status(), "Logout request rejected");
                }
                Err(e) => {
                    warn!(error = %transport_failure(e), "Logout request failed");
                }
            }
        }

        info!("Logged out");
        self.events.emit(AuthEvent::signed_out());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
