//! High-level SiriusXM client
//!
//! [`SiriusXmClient`] ties the session chain, the stream registry and the
//! playback gateway together. It is cheap to clone; clones share the same
//! session and registry.

use crate::api::catalog::extract_hydrated_data;
use crate::api::{SxmApi, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_WEB_BASE_URL};
use crate::auth::{AuthManager, AuthPhase};
use crate::error::Result;
use crate::gateway::PlaybackGateway;
use crate::models::{Bitrate, Channel, Credentials, PlaybackKey};
use crate::stream::{StreamHandle, StreamResolver};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug)]
struct ClientInner {
    api: SxmApi,
    auth: Arc<AuthManager>,
    resolver: StreamResolver,
    gateway: PlaybackGateway,
    player_config: RwLock<Value>,
}

/// Client SiriusXM haut-niveau
#[derive(Debug, Clone)]
pub struct SiriusXmClient {
    inner: Arc<ClientInner>,
}

/// Builder for [`SiriusXmClient`]
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_base_url: String,
    web_base_url: String,
    timeout: Duration,
    client: Option<reqwest::Client>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client: None,
        }
    }

    /// Base URL of session, catalogue and playback endpoints
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Base URL of the player page
    pub fn web_base_url(mut self, url: impl Into<String>) -> Self {
        self.web_base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Custom reqwest client; default headers and timeout are then up to the caller
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds an unconnected client
    pub fn build(self, credentials: Credentials) -> Result<SiriusXmClient> {
        let api = match self.client {
            Some(client) => SxmApi::with_client(client, self.api_base_url, self.web_base_url),
            None => SxmApi::with_settings(self.api_base_url, self.web_base_url, self.timeout)?,
        };
        Ok(SiriusXmClient::from_api(api, credentials))
    }
}

impl SiriusXmClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Unconnected client against the production endpoints
    pub fn new(credentials: Credentials) -> Result<Self> {
        ClientBuilder::new().build(credentials)
    }

    /// Unconnected client using the `accounts.siriusxm` settings of `config`
    #[cfg(feature = "pmoconfig")]
    pub fn from_config(config: &pmoconfig::Config, credentials: Credentials) -> Result<Self> {
        use crate::config_ext::SiriusXmConfigExt;

        ClientBuilder::new()
            .api_base_url(config.get_sxm_api_base_url())
            .web_base_url(config.get_sxm_web_base_url())
            .timeout(config.get_sxm_request_timeout())
            .build(credentials)
    }

    fn from_api(api: SxmApi, credentials: Credentials) -> Self {
        let auth = Arc::new(AuthManager::new(api.clone(), credentials));
        Self {
            inner: Arc::new(ClientInner {
                resolver: StreamResolver::new(api.clone(), auth.clone()),
                gateway: PlaybackGateway::new(api.clone(), auth.clone()),
                api,
                auth,
                player_config: RwLock::new(Value::Object(Default::default())),
            }),
        }
    }

    /// Runs the authentication chain and loads the player configuration
    pub async fn connect(&self) -> Result<()> {
        info!("Connecting to SiriusXM as {}", self.inner.auth.username());
        self.inner.auth.connect().await?;
        self.load_player_config(None).await?;
        Ok(())
    }

    /// Drops the local session; the remote session is left as is
    pub async fn disconnect(&self) {
        self.inner.auth.disconnect().await;
    }

    pub fn auth(&self) -> &AuthManager {
        &self.inner.auth
    }

    pub async fn phase(&self) -> AuthPhase {
        self.inner.auth.phase().await
    }

    pub fn api(&self) -> &SxmApi {
        &self.inner.api
    }

    pub fn resolver(&self) -> &StreamResolver {
        &self.inner.resolver
    }

    pub fn gateway(&self) -> &PlaybackGateway {
        &self.inner.gateway
    }

    // ============ Catalogue ============

    /// Library entities of the account
    pub async fn get_library(&self) -> Result<Vec<Value>> {
        let token = self.inner.auth.ensure_valid_token().await?;
        Ok(self.inner.api.get_library(&token).await?)
    }

    /// Linear and on-demand channels
    pub async fn get_channels(&self) -> Result<Vec<Channel>> {
        let token = self.inner.auth.ensure_valid_token().await?;
        Ok(self.inner.api.get_channels(&token).await?)
    }

    /// Episodes of a podcast show
    pub async fn get_podcast_episodes(&self, podcast_entity_id: &str) -> Result<Vec<Value>> {
        let token = self.inner.auth.ensure_valid_token().await?;
        Ok(self
            .inner
            .api
            .get_podcast_episodes(&token, podcast_entity_id)
            .await?)
    }

    /// Fetches the web player page and keeps its `config` block
    ///
    /// With `to_file`, the whole hydrated document is also written there,
    /// pretty-printed.
    pub async fn load_player_config(&self, to_file: Option<&Path>) -> Result<Value> {
        let token = self.inner.auth.ensure_valid_token().await?;
        let html = self.inner.api.get_player_page(&token).await?;
        let hydrated = extract_hydrated_data(&html)?;

        if let Some(path) = to_file {
            let pretty = serde_json::to_string_pretty(&hydrated)?;
            tokio::fs::write(path, pretty).await?;
            debug!("Player data written to {}", path.display());
        }

        let config = hydrated
            .get("config")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        *self.inner.player_config.write().await = config.clone();
        Ok(config)
    }

    /// Last loaded player configuration (`{}` before the first load)
    pub async fn player_config(&self) -> Value {
        self.inner.player_config.read().await.clone()
    }

    // ============ Streams ============

    /// Handle of an entity, initialized once
    pub async fn get_stream(&self, entity_type: &str, entity_id: &str) -> Result<Arc<StreamHandle>> {
        self.inner.resolver.resolve(entity_type, entity_id).await
    }

    /// Playlist of an entity at `bitrate`
    pub async fn get_playlist(
        &self,
        entity_type: &str,
        entity_id: &str,
        bitrate: Bitrate,
    ) -> Result<String> {
        let handle = self.get_stream(entity_type, entity_id).await?;
        self.inner.gateway.get_playlist(&handle, bitrate).await
    }

    /// Playlist of an entity at `bitrate`, re-tuned first
    ///
    /// Live playlists roll forward, so the tune source and the per-bitrate
    /// URLs are refreshed on every call. Concurrent calls for the same entity
    /// run one after the other on the handle lock.
    pub async fn get_live_playlist(
        &self,
        entity_type: &str,
        entity_id: &str,
        bitrate: Bitrate,
    ) -> Result<String> {
        let handle = self.inner.resolver.handle(entity_type, entity_id).await;
        self.inner.resolver.initialize(&handle).await?;
        self.inner.gateway.get_playlist(&handle, bitrate).await
    }

    /// Audio segment of an entity at `bitrate`
    pub async fn get_segment(
        &self,
        entity_type: &str,
        entity_id: &str,
        segment_file: &str,
        bitrate: Bitrate,
    ) -> Result<Vec<u8>> {
        let handle = self.get_stream(entity_type, entity_id).await?;
        self.inner
            .gateway
            .get_segment(&handle, segment_file, bitrate)
            .await
    }

    /// Key structure of an entity
    pub async fn get_key(&self, entity_type: &str, entity_id: &str) -> Result<PlaybackKey> {
        let handle = self.get_stream(entity_type, entity_id).await?;
        self.inner.gateway.get_key(&handle).await
    }

    /// Raw AES key of an entity
    pub async fn get_key_bytes(&self, entity_type: &str, entity_id: &str) -> Result<Vec<u8>> {
        self.get_key(entity_type, entity_id).await?.decode()
    }
}
