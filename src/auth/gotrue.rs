//! GoTrue (Supabase Auth) REST client and provider.
//!
//! `GoTrueClient` is a thin HTTP wrapper over `/auth/v1`. `GoTrueProvider`
//! keeps the signed-in session in memory and emits the matching `AuthEvent`
//! after each state change. `TokenSession` validates a single bearer token per
//! request for the server-side page guard. Parsing lives in pure functions for
//! testability.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use super::{
    AuthError, AuthEvent, AuthListener, AuthProvider, Listeners, Session, SessionSource, SessionUser, Subscription,
    lock,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoTrueConfig {
    /// Project URL without trailing slash, e.g. `https://abc.supabase.co`.
    pub url: String,
    pub anon_key: String,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GoTrueConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.url.trim_end_matches('/').to_owned(), anon_key: config.anon_key.clone() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, AuthError> {
        let response = request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(AuthError::Api { status, body });
        }
        Ok(body)
    }

    /// `POST /token?grant_type=password`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a rejected login, or an unparseable response.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = self
            .send(
                self.http
                    .post(self.endpoint("token?grant_type=password"))
                    .json(&serde_json::json!({ "email": email, "password": password })),
            )
            .await?;
        parse_session(&body, unix_now())
    }

    /// `POST /signup`. Returns `None` when the account awaits email confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected signup.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<Option<Session>, AuthError> {
        let mut request = self
            .http
            .post(self.endpoint("signup"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        let body = self.send(request).await?;
        parse_signup(&body, unix_now())
    }

    /// `POST /token?grant_type=refresh_token`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, an expired refresh token, or an unparseable response.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let body = self
            .send(
                self.http
                    .post(self.endpoint("token?grant_type=refresh_token"))
                    .json(&serde_json::json!({ "refresh_token": refresh_token })),
            )
            .await?;
        parse_session(&body, unix_now())
    }

    /// `GET /user`. `Ok(None)` means the token is not (or no longer) valid.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any other non-success status.
    pub async fn get_user(&self, access_token: &str) -> Result<Option<SessionUser>, AuthError> {
        let result = self
            .send(self.http.get(self.endpoint("user")).bearer_auth(access_token))
            .await;
        match result {
            Ok(body) => parse_user(&body).map(Some),
            Err(AuthError::Api { status: 401 | 403, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `PUT /user` with a new password.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected update.
    pub async fn update_password(&self, access_token: &str, password: &str) -> Result<SessionUser, AuthError> {
        let body = self
            .send(
                self.http
                    .put(self.endpoint("user"))
                    .bearer_auth(access_token)
                    .json(&serde_json::json!({ "password": password })),
            )
            .await?;
        parse_user(&body)
    }

    /// `POST /recover` — send a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected request.
    pub async fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>) -> Result<(), AuthError> {
        let mut request = self
            .http
            .post(self.endpoint("recover"))
            .json(&serde_json::json!({ "email": email }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        self.send(request).await.map(|_| ())
    }

    /// `POST /logout` — revoke the session server-side.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected request.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.send(self.http.post(self.endpoint("logout")).bearer_auth(access_token))
            .await
            .map(|_| ())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    user: SessionUser,
}

// =============================================================================
// PARSING
// =============================================================================

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

fn parse_session(json: &str, now: i64) -> Result<Session, AuthError> {
    let token: TokenResponse = serde_json::from_str(json).map_err(|e| AuthError::Parse(e.to_string()))?;
    let expires_at = token
        .expires_at
        .or_else(|| token.expires_in.map(|secs| now.saturating_add(secs)));
    Ok(Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
        token_type: token.token_type,
        user: token.user,
    })
}

/// Signup answers with a full token response when auto-confirm is on and with
/// a bare user object when confirmation email is pending.
fn parse_signup(json: &str, now: i64) -> Result<Option<Session>, AuthError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| AuthError::Parse(e.to_string()))?;
    if value.get("access_token").is_some() {
        return parse_session(json, now).map(Some);
    }
    parse_user(json).map(|_| None)
}

fn parse_user(json: &str) -> Result<SessionUser, AuthError> {
    serde_json::from_str(json).map_err(|e| AuthError::Parse(e.to_string()))
}

// =============================================================================
// PROVIDER
// =============================================================================

/// In-process auth provider backed by GoTrue.
pub struct GoTrueProvider {
    client: Arc<GoTrueClient>,
    current: Mutex<Option<Session>>,
    listeners: Listeners,
}

impl GoTrueProvider {
    #[must_use]
    pub fn new(client: Arc<GoTrueClient>) -> Self {
        Self { client, current: Mutex::new(None), listeners: Listeners::new() }
    }

    /// Adopt a previously persisted session.
    pub fn restore(&self, session: Session) {
        self.apply(AuthEvent::InitialSession, Some(session));
    }

    /// # Errors
    ///
    /// Returns the client error; the current session is left unchanged.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.client.sign_in_with_password(email, password).await?;
        self.apply(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns the client error; the current session is left unchanged.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<Option<Session>, AuthError> {
        let session = self.client.sign_up(email, password, redirect_to).await?;
        if let Some(session) = &session {
            self.apply(AuthEvent::SignedIn, Some(session.clone()));
        }
        Ok(session)
    }

    /// Exchange the current refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `NoSession` when signed out or without a refresh token, else the client error.
    pub async fn refresh(&self) -> Result<Session, AuthError> {
        let refresh_token = self
            .snapshot()
            .and_then(|s| s.refresh_token)
            .ok_or(AuthError::NoSession)?;
        let session = self.client.refresh_session(&refresh_token).await?;
        self.apply(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `NoSession` when signed out, else the client error.
    pub async fn update_password(&self, password: &str) -> Result<(), AuthError> {
        let mut session = self.snapshot().ok_or(AuthError::NoSession)?;
        session.user = self
            .client
            .update_password(&session.access_token, password)
            .await?;
        self.apply(AuthEvent::UserUpdated, Some(session));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the client error.
    pub async fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>) -> Result<(), AuthError> {
        self.client.reset_password_for_email(email, redirect_to).await
    }

    /// Clear the local session, notify listeners, then revoke it remotely.
    ///
    /// # Errors
    ///
    /// Returns the remote revocation error. Local state is cleared regardless.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.snapshot();
        self.apply(AuthEvent::SignedOut, None);
        match previous {
            Some(session) => self.client.sign_out(&session.access_token).await,
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> Option<Session> {
        lock(&self.current).clone()
    }

    fn apply(&self, event: AuthEvent, session: Option<Session>) {
        lock(&self.current).clone_from(&session);
        self.listeners.emit(event, session.as_ref());
    }
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.snapshot())
    }

    fn subscribe(&self, listener: AuthListener) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

#[async_trait::async_trait]
impl SessionSource for GoTrueProvider {
    async fn session(&self) -> Result<Option<Session>, AuthError> {
        self.get_session().await
    }
}

// =============================================================================
// PER-REQUEST SOURCE
// =============================================================================

/// Session for one inbound request: the caller's bearer token checked live.
pub struct TokenSession {
    client: Option<Arc<GoTrueClient>>,
    access_token: Option<String>,
}

impl TokenSession {
    #[must_use]
    pub fn new(client: Option<Arc<GoTrueClient>>, access_token: Option<String>) -> Self {
        Self { client, access_token }
    }
}

#[async_trait::async_trait]
impl SessionSource for TokenSession {
    async fn session(&self) -> Result<Option<Session>, AuthError> {
        let Some(access_token) = self.access_token.as_deref() else {
            return Ok(None);
        };
        let client = self.client.as_ref().ok_or(AuthError::NotConfigured)?;
        let user = client.get_user(access_token).await?;
        Ok(user.map(|user| Session {
            access_token: access_token.to_owned(),
            refresh_token: None,
            expires_at: None,
            token_type: Some("bearer".to_owned()),
            user,
        }))
    }
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
