//! Session chain and bearer token lifecycle
//!
//! The chain runs strictly in order:
//!
//! ```text
//! Unauthenticated -> DeviceReady -> AnonymousReady -> IdentityChecked
//!                 -> PasswordVerified -> Authenticated
//! ```
//!
//! An expired token sends the manager back to `Unauthenticated`; the cached
//! device session lets the next run skip registration. All state sits behind
//! one async mutex held for the whole refresh, so concurrent callers that find
//! the token missing or expired wait for a single chain run and then reuse its
//! token.

use crate::api::SxmApi;
use crate::error::{AuthenticationError, Result, TransportError};
use crate::models::{AccessToken, Credentials, DeviceSession};
use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Position in the authentication chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    DeviceReady,
    AnonymousReady,
    IdentityChecked,
    PasswordVerified,
    Authenticated,
}

#[derive(Debug)]
struct AuthState {
    device: Option<DeviceSession>,
    token: Option<AccessToken>,
    phase: AuthPhase,
}

impl AuthState {
    fn reset(&mut self) {
        self.token = None;
        self.phase = AuthPhase::Unauthenticated;
    }
}

/// Owns the session chain of one account
#[derive(Debug)]
pub struct AuthManager {
    api: SxmApi,
    credentials: Credentials,
    state: Mutex<AuthState>,
}

impl AuthManager {
    pub fn new(api: SxmApi, credentials: Credentials) -> Self {
        Self {
            api,
            credentials,
            state: Mutex::new(AuthState {
                device: None,
                token: None,
                phase: AuthPhase::Unauthenticated,
            }),
        }
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Registers a fresh device and runs the whole chain
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.device = None;
        state.reset();
        self.authenticate(&mut state).await?;
        Ok(())
    }

    /// Returns a bearer token that is valid now
    ///
    /// A missing token, or one at or past its expiry, triggers a chain run
    /// before returning.
    pub async fn ensure_valid_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        match &state.token {
            Some(token) if !token.is_expired_at(now) => return Ok(token.token.clone()),
            Some(_) => info!("Access token expired; requesting a new one"),
            None => debug!("No access token held; authenticating"),
        }

        state.reset();
        self.authenticate(&mut state).await
    }

    /// Drops the local session state
    ///
    /// There is no server-side logout.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        state.device = None;
        state.reset();
        debug!("SiriusXM session for {} released", self.credentials.username);
    }

    pub async fn phase(&self) -> AuthPhase {
        self.state.lock().await.phase
    }

    /// Token currently held, expired or not
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.state.lock().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.lock().await;
        state.phase == AuthPhase::Authenticated
            && state.token.as_ref().is_some_and(|t| !t.is_expired())
    }

    async fn authenticate(&self, state: &mut MutexGuard<'_, AuthState>) -> Result<String> {
        match self.run_chain(state).await {
            Ok(token) => Ok(token),
            Err(e) => {
                warn!("Authentication of {} failed: {}", self.credentials.username, e);
                state.reset();
                Err(e.into())
            }
        }
    }

    async fn run_chain(
        &self,
        state: &mut MutexGuard<'_, AuthState>,
    ) -> std::result::Result<String, AuthenticationError> {
        let username = &self.credentials.username;
        let wrap = |e: TransportError| {
            AuthenticationError::with_cause(
                format!("An error occurred during authentication of user {}", username),
                e,
            )
        };

        let cached_grant = state.device.as_ref().map(|d| d.grant.clone());
        let device_grant = match cached_grant {
            Some(grant) => grant,
            None => {
                let device = self.api.create_device_session().await.map_err(wrap)?;
                let grant = device.grant.clone();
                state.device = Some(device);
                grant
            }
        };
        state.phase = AuthPhase::DeviceReady;

        let anonymous = self
            .api
            .create_anonymous_session(&device_grant)
            .await
            .map_err(wrap)?;
        state.phase = AuthPhase::AnonymousReady;

        let identity = self
            .api
            .get_identity_status(&anonymous.access_token, username)
            .await
            .map_err(wrap)?;
        state.phase = AuthPhase::IdentityChecked;

        if !identity.has_password {
            return Err(AuthenticationError::new(format!(
                "user has no password set ({})",
                username
            )));
        }

        let grant = self
            .api
            .authenticate_with_password(&anonymous.access_token, &self.credentials)
            .await
            .map_err(wrap)?;
        state.phase = AuthPhase::PasswordVerified;

        let session = self
            .api
            .create_authenticated_session(&grant.grant)
            .await
            .map_err(wrap)?;

        let token = AccessToken::from(session);
        info!(
            "Authenticated {} on SiriusXM (token valid until {})",
            username, token.expires_at
        );
        let bearer = token.token.clone();
        state.token = Some(token);
        state.phase = AuthPhase::Authenticated;

        Ok(bearer)
    }
}
