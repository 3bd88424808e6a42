//! Endpoints of the session chain
//!
//! Each step takes the bearer produced by the previous one. Sequencing and
//! token storage are handled by [`crate::auth::AuthManager`].

use super::{device_payload, SxmApi};
use crate::error::TransportError;
use crate::models::{
    AnonymousSession, AuthenticatedSession, AuthenticationGrant, Credentials, DeviceSession,
    IdentityStatus,
};
use serde_json::{json, Value};

type StepResult<T> = std::result::Result<T, TransportError>;

impl SxmApi {
    /// Registers a web-desktop device
    pub async fn create_device_session(&self) -> StepResult<DeviceSession> {
        let url = self.api_url("/device/v1/devices");
        self.post_json(&url, None, &device_payload()).await
    }

    /// Opens an anonymous session with the device grant
    pub async fn create_anonymous_session(&self, device_grant: &str) -> StepResult<AnonymousSession> {
        let url = self.api_url("/session/v1/sessions/anonymous");
        self.post_json(&url, Some(device_grant), &Value::Bool(true))
            .await
    }

    /// Looks up whether `handle` has a password
    pub async fn get_identity_status(
        &self,
        anonymous_token: &str,
        handle: &str,
    ) -> StepResult<IdentityStatus> {
        let url = self.api_url("/identity/v1/identities/status");
        self.get_json(&url, Some(anonymous_token), &[("handle", handle)])
            .await
    }

    /// Exchanges username and password for an authentication grant
    pub async fn authenticate_with_password(
        &self,
        anonymous_token: &str,
        credentials: &Credentials,
    ) -> StepResult<AuthenticationGrant> {
        let url = self.api_url("/identity/v1/identities/authenticate/password");
        let body = json!({
            "handle": credentials.username,
            "password": credentials.password,
        });
        self.post_json(&url, Some(anonymous_token), &body).await
    }

    /// Mints the session whose token is used for every user request
    pub async fn create_authenticated_session(
        &self,
        authentication_grant: &str,
    ) -> StepResult<AuthenticatedSession> {
        let url = self.api_url("/session/v1/sessions/authenticated");
        self.post_json(&url, Some(authentication_grant), &Value::Bool(true))
            .await
    }
}
