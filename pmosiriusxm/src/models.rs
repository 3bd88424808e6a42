//! Data models for the SiriusXM web API
//!
//! Session payloads are kept opaque: only the fields the authentication chain
//! needs are typed, everything else is preserved in `extra`.

use crate::error::{Error, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Credentials
// ============================================================================

/// Environment variable holding the SiriusXM username
pub const ENV_USERNAME: &str = "SXM_USERNAME";
/// Environment variable holding the SiriusXM password
pub const ENV_PASSWORD: &str = "SXM_PASSWORD";

/// Username and password of the SiriusXM account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Explicit values first, then `SXM_USERNAME` / `SXM_PASSWORD`
    pub fn resolve(username: Option<String>, password: Option<String>) -> Result<Self> {
        Self::resolve_with(username, password, |key| std::env::var(key).ok())
    }

    /// Credentials taken from the environment only
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }

    /// Same as [`Credentials::resolve`] with a custom variable lookup
    pub fn resolve_with<F>(
        username: Option<String>,
        password: Option<String>,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = username
            .or_else(|| lookup(ENV_USERNAME))
            .filter(|u| !u.is_empty())
            .ok_or(Error::MissingCredentials(ENV_USERNAME))?;
        let password = password
            .or_else(|| lookup(ENV_PASSWORD))
            .filter(|p| !p.is_empty())
            .ok_or(Error::MissingCredentials(ENV_PASSWORD))?;

        Ok(Self { username, password })
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Grant returned by device registration
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSession {
    pub grant: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Short-lived session used for identity lookup and password authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousSession {
    pub access_token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity status of a username
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStatus {
    #[serde(default)]
    pub has_password: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grant produced by password authentication
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationGrant {
    pub grant: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Session whose bearer token is attached to every user request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedSession {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bearer token and its absolute expiry
///
/// Token and expiry only exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl From<AuthenticatedSession> for AccessToken {
    fn from(session: AuthenticatedSession) -> Self {
        Self {
            token: session.access_token,
            expires_at: session.access_token_expires_at,
        }
    }
}

// ============================================================================
// Bitrates
// ============================================================================

/// Audio bitrates offered by the HLS manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bitrate {
    #[default]
    K256,
    K96,
    K64,
    K32,
}

impl Bitrate {
    /// Highest first; also the manifest probe order
    pub const ALL: [Bitrate; 4] = [Bitrate::K256, Bitrate::K96, Bitrate::K64, Bitrate::K32];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bitrate::K256 => "256k",
            Bitrate::K96 => "96k",
            Bitrate::K64 => "64k",
            Bitrate::K32 => "32k",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Bitrate::K256 => 0,
            Bitrate::K96 => 1,
            Bitrate::K64 => 2,
            Bitrate::K32 => 3,
        }
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bitrate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Bitrate::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::other(format!("Unknown bitrate: {}", s)))
    }
}

// ============================================================================
// Playback
// ============================================================================

/// Tune source descriptor returned by `playback/play/v1/tuneSource`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuneSource {
    #[serde(default)]
    pub streams: Vec<TuneStream>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneStream {
    pub id: String,
    #[serde(default)]
    pub urls: Vec<TuneUrl>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneUrl {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TuneSource {
    /// First stream of the descriptor
    pub fn primary_stream(&self) -> Option<&TuneStream> {
        self.streams.first()
    }

    /// Id of the first stream
    pub fn stream_id(&self) -> Option<&str> {
        self.primary_stream().map(|s| s.id.as_str())
    }

    /// URL of the bitrate-index manifest
    pub fn streams_by_bitrate_url(&self) -> Option<&str> {
        self.primary_stream()
            .and_then(|s| s.urls.first())
            .map(|u| u.url.as_str())
    }

    /// Manifest URL with its last path segment removed
    pub fn base_url(&self) -> Option<&str> {
        self.streams_by_bitrate_url().map(directory_of)
    }
}

/// Everything before the last `/`
pub(crate) fn directory_of(url: &str) -> &str {
    url.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(url)
}

/// Key material returned by `playback/key/v1/{id}`
///
/// `key` is base64; decoding is left to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackKey {
    pub key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlaybackKey {
    /// Raw AES key bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(base64::engine::general_purpose::STANDARD.decode(self.key.trim())?)
    }
}

// ============================================================================
// Catalogue
// ============================================================================

/// Channel entry as served by the proxy's `/channels`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "channelNumber")]
    pub channel_number: Value,
    pub unentitled: Value,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: String,
    pub title: String,
    pub title_short: Option<String>,
    pub description: Option<String>,
    pub images: Value,
}

/// Raw container item of `relationship/v1/container/*`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContainerItem {
    #[serde(default)]
    pub decorations: Decorations,
    pub entity: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Decorations {
    #[serde(default)]
    pub channel_number: Value,
    #[serde(default)]
    pub unentitled: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContainerResponse {
    pub container: Container,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Container {
    #[serde(default)]
    pub sets: Vec<ContainerSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContainerSet {
    #[serde(default)]
    pub items: Vec<ContainerItem>,
}

impl ContainerResponse {
    /// Items of the first set, empty when the container has no set
    pub fn into_first_set_items(self) -> Vec<ContainerItem> {
        self.container
            .sets
            .into_iter()
            .next()
            .map(|s| s.items)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LibraryResponse {
    #[serde(default)]
    pub all_data_map: Map<String, Value>,
}

impl Channel {
    /// Projects a container item; `None` when the entity lacks id, type or title
    pub(crate) fn from_item(item: ContainerItem) -> Option<Self> {
        let entity = item.entity;
        let text = |path: &[&str]| -> Option<String> {
            let mut current = entity.get("texts")?;
            for key in path {
                current = current.get(key)?;
            }
            current.as_str().map(str::to_string)
        };

        Some(Self {
            channel_number: item.decorations.channel_number,
            unentitled: item.decorations.unentitled,
            entity_type: entity.get("type")?.as_str()?.to_string(),
            id: entity.get("id")?.as_str()?.to_string(),
            title: text(&["title", "default"])?,
            title_short: text(&["title", "short"]),
            description: text(&["description", "default"]),
            images: entity.get("images").cloned().unwrap_or(Value::Null),
        })
    }
}
