//! Stream resolution
//!
//! A [`StreamHandle`] exists once per `(entity_type, entity_id)` pair for the
//! lifetime of the client. Its state is filled by a tune-source request
//! followed by a scan of the bitrate-index manifest.

use crate::api::SxmApi;
use crate::auth::AuthManager;
use crate::error::{Error, Result};
use crate::models::{directory_of, Bitrate, TuneSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Playlist URL per bitrate, `None` when the manifest does not offer it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitrateMap {
    urls: [Option<String>; 4],
}

impl BitrateMap {
    /// Scans `manifest` line by line in [`Bitrate::ALL`] order
    ///
    /// For each bitrate the first line containing `_{bitrate}_full_v3.m3u8`
    /// wins; its trimmed content is appended to `base_url`. Unmatched
    /// bitrates stay `None`.
    pub fn parse(manifest: &str, base_url: &str) -> Self {
        let mut map = Self::default();
        for bitrate in Bitrate::ALL {
            let needle = format!("_{}_full_v3.m3u8", bitrate);
            map.urls[bitrate.index()] = manifest
                .lines()
                .find(|line| line.contains(&needle))
                .map(|line| format!("{}/{}", base_url, line.trim()));
        }
        map
    }

    pub fn get(&self, bitrate: Bitrate) -> Option<&str> {
        self.urls[bitrate.index()].as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bitrate, Option<&str>)> + '_ {
        Bitrate::ALL.into_iter().map(move |b| (b, self.get(b)))
    }

    /// Bitrates that have a playlist, highest first
    pub fn available(&self) -> Vec<Bitrate> {
        self.iter()
            .filter_map(|(b, url)| url.map(|_| b))
            .collect()
    }
}

/// Resolved state of an initialized stream
#[derive(Debug, Clone)]
pub struct StreamState {
    pub tune_source: TuneSource,
    pub stream_id: String,
    pub streams_by_bitrate_url: String,
    pub streams_by_bitrate: BitrateMap,
}

impl StreamState {
    /// Checks the descriptor and scans the manifest
    pub fn from_parts(
        entity_type: &str,
        entity_id: &str,
        tune_source: TuneSource,
        manifest: &str,
    ) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidTuneSource {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            reason: reason.to_string(),
        };

        let stream_id = tune_source
            .stream_id()
            .ok_or_else(|| invalid("no stream"))?
            .to_string();
        let streams_by_bitrate_url = tune_source
            .streams_by_bitrate_url()
            .ok_or_else(|| invalid("no manifest URL"))?
            .to_string();
        let streams_by_bitrate =
            BitrateMap::parse(manifest, directory_of(&streams_by_bitrate_url));

        Ok(Self {
            tune_source,
            stream_id,
            streams_by_bitrate_url,
            streams_by_bitrate,
        })
    }

    /// Manifest URL with its last path segment removed
    pub fn base_url(&self) -> &str {
        directory_of(&self.streams_by_bitrate_url)
    }

    pub fn playlist_url(&self, bitrate: Bitrate) -> Option<&str> {
        self.streams_by_bitrate.get(bitrate)
    }
}

/// One playable entity
#[derive(Debug)]
pub struct StreamHandle {
    entity_type: String,
    entity_id: String,
    state: Mutex<Option<Arc<StreamState>>>,
}

impl StreamHandle {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            state: Mutex::new(None),
        }
    }

    /// Handle already carrying resolved state
    pub fn with_state(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        state: StreamState,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            state: Mutex::new(Some(Arc::new(state))),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Resolved state, [`Error::NotInitialized`] before the first initialization
    pub async fn state(&self) -> Result<Arc<StreamState>> {
        self.state
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::NotInitialized {
                entity_type: self.entity_type.clone(),
                entity_id: self.entity_id.clone(),
            })
    }

    pub async fn stream_id(&self) -> Result<String> {
        Ok(self.state().await?.stream_id.clone())
    }

    pub async fn base_url(&self) -> Result<String> {
        Ok(self.state().await?.base_url().to_string())
    }

    pub async fn streams_by_bitrate_url(&self) -> Result<String> {
        Ok(self.state().await?.streams_by_bitrate_url.clone())
    }

    pub async fn streams_by_bitrate(&self) -> Result<BitrateMap> {
        Ok(self.state().await?.streams_by_bitrate.clone())
    }
}

/// Registry of stream handles, one per entity pair
///
/// The map lock only covers lookup and insertion. Initialization holds the
/// handle's own lock, so callers racing on the same pair wait for the
/// in-flight run and then see its result.
#[derive(Debug)]
pub struct StreamResolver {
    api: SxmApi,
    auth: Arc<AuthManager>,
    handles: Mutex<HashMap<(String, String), Arc<StreamHandle>>>,
}

impl StreamResolver {
    pub fn new(api: SxmApi, auth: Arc<AuthManager>) -> Self {
        Self {
            api,
            auth,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle of a pair, creating it if needed (no I/O)
    pub async fn handle(&self, entity_type: &str, entity_id: &str) -> Arc<StreamHandle> {
        let mut handles = self.handles.lock().await;
        handles
            .entry((entity_type.to_string(), entity_id.to_string()))
            .or_insert_with(|| Arc::new(StreamHandle::new(entity_type, entity_id)))
            .clone()
    }

    /// Handle of a pair, initialized at most once
    pub async fn resolve(&self, entity_type: &str, entity_id: &str) -> Result<Arc<StreamHandle>> {
        let handle = self.handle(entity_type, entity_id).await;

        let mut state = handle.state.lock().await;
        if state.is_none() {
            *state = Some(Arc::new(self.fetch_state(&handle).await?));
        }
        drop(state);

        Ok(handle)
    }

    /// Re-runs tune and manifest scan unconditionally
    pub async fn initialize(&self, handle: &StreamHandle) -> Result<()> {
        let mut state = handle.state.lock().await;
        *state = Some(Arc::new(self.fetch_state(handle).await?));
        Ok(())
    }

    /// Number of handles created so far
    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn fetch_state(&self, handle: &StreamHandle) -> Result<StreamState> {
        let (entity_type, entity_id) = (handle.entity_type(), handle.entity_id());
        debug!("Tuning {}/{}", entity_type, entity_id);

        let token = self.auth.ensure_valid_token().await?;
        let tune_source = self
            .api
            .create_tune_source(&token, entity_type, entity_id)
            .await?;

        let manifest_url = tune_source
            .streams_by_bitrate_url()
            .ok_or_else(|| Error::InvalidTuneSource {
                entity_type: entity_type.to_string(),
                entity_id: entity_id.to_string(),
                reason: "no manifest URL".to_string(),
            })?
            .to_string();

        let token = self.auth.ensure_valid_token().await?;
        let manifest = self.api.fetch_document(&token, &manifest_url).await?;

        let state = StreamState::from_parts(entity_type, entity_id, tune_source, &manifest)?;
        info!(
            "Stream {}/{} ready with bitrates {:?}",
            entity_type,
            entity_id,
            state
                .streams_by_bitrate
                .available()
                .iter()
                .map(Bitrate::as_str)
                .collect::<Vec<_>>()
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MANIFEST: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=281600,CODECS=\"mp4a.40.2\"\n\
9450_256k_full_v3/9450_256k_full_v3.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=70400,CODECS=\"mp4a.40.5\"\n\
  9450_64k_full_v3/9450_64k_full_v3.m3u8  \r\n";

    #[test]
    fn test_parse_keeps_only_matching_bitrates() {
        let map = BitrateMap::parse(MANIFEST, "https://cdn.example.com/AAC_Data/9450");

        assert_eq!(
            map.get(Bitrate::K256),
            Some("https://cdn.example.com/AAC_Data/9450/9450_256k_full_v3/9450_256k_full_v3.m3u8")
        );
        assert_eq!(map.get(Bitrate::K96), None);
        assert_eq!(
            map.get(Bitrate::K64),
            Some("https://cdn.example.com/AAC_Data/9450/9450_64k_full_v3/9450_64k_full_v3.m3u8")
        );
        assert_eq!(map.get(Bitrate::K32), None);
        assert_eq!(map.available(), vec![Bitrate::K256, Bitrate::K64]);
    }

    #[test]
    fn test_parse_first_match_wins() {
        let manifest = "a_96k_full_v3.m3u8\nb_96k_full_v3.m3u8\n";
        let map = BitrateMap::parse(manifest, "http://h");
        assert_eq!(map.get(Bitrate::K96), Some("http://h/a_96k_full_v3.m3u8"));
    }

    #[test]
    fn test_parse_empty_manifest() {
        let map = BitrateMap::parse("", "http://h");
        assert!(map.available().is_empty());
    }

    #[test]
    fn test_state_requires_stream() {
        let err = StreamState::from_parts("channel-linear", "x", TuneSource::default(), "")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTuneSource { .. }));
    }

    #[tokio::test]
    async fn test_handle_accessors() {
        let tune: TuneSource = serde_json::from_value(json!({
            "streams": [{
                "id": "stream-42",
                "urls": [{"url": "https://cdn.example.com/AAC_Data/9450/9450_variant.m3u8"}]
            }]
        }))
        .unwrap();
        let state = StreamState::from_parts("channel-linear", "9450", tune, MANIFEST).unwrap();
        let handle = StreamHandle::with_state("channel-linear", "9450", state);

        assert!(handle.is_initialized().await);
        assert_eq!(handle.stream_id().await.unwrap(), "stream-42");
        assert_eq!(
            handle.base_url().await.unwrap(),
            "https://cdn.example.com/AAC_Data/9450"
        );
        assert_eq!(
            handle.streams_by_bitrate_url().await.unwrap(),
            "https://cdn.example.com/AAC_Data/9450/9450_variant.m3u8"
        );
    }

    #[tokio::test]
    async fn test_uninitialized_handle() {
        let handle = StreamHandle::new("channel-linear", "9450");
        assert!(!handle.is_initialized().await);
        assert!(matches!(
            handle.stream_id().await,
            Err(Error::NotInitialized { .. })
        ));
    }
}
