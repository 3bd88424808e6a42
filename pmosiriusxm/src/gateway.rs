//! Playlist, segment and key retrieval for resolved streams

use crate::api::SxmApi;
use crate::auth::AuthManager;
use crate::error::{Error, Result};
use crate::models::{Bitrate, PlaybackKey};
use crate::stream::{StreamHandle, StreamState};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Entity type of live channels, whose key id is the nil UUID
pub const LINEAR_CHANNEL_TYPE: &str = "channel-linear";

/// Key id used for an entity
pub fn key_id_for(entity_type: &str, stream_id: &str) -> String {
    if entity_type == LINEAR_CHANNEL_TYPE {
        Uuid::nil().to_string()
    } else {
        stream_id.to_string()
    }
}

/// Second-to-last `/`-delimited component of a playlist URL
pub fn bitrate_directory(playlist_url: &str) -> Option<&str> {
    let mut parts = playlist_url.rsplit('/');
    parts.next()?;
    parts.next()
}

#[derive(Debug, Clone)]
pub struct PlaybackGateway {
    api: SxmApi,
    auth: Arc<AuthManager>,
}

impl PlaybackGateway {
    pub fn new(api: SxmApi, auth: Arc<AuthManager>) -> Self {
        Self { api, auth }
    }

    /// Playlist document of the stream at `bitrate`
    pub async fn get_playlist(&self, handle: &StreamHandle, bitrate: Bitrate) -> Result<String> {
        let state = handle.state().await?;
        let url = playlist_url(handle, &state, bitrate)?;

        let token = self.auth.ensure_valid_token().await?;
        Ok(self.api.fetch_document(&token, url).await?)
    }

    /// Audio segment `segment_file` of the stream at `bitrate`
    pub async fn get_segment(
        &self,
        handle: &StreamHandle,
        segment_file: &str,
        bitrate: Bitrate,
    ) -> Result<Vec<u8>> {
        let state = handle.state().await?;
        let playlist = playlist_url(handle, &state, bitrate)?;
        let directory = bitrate_directory(playlist).ok_or_else(|| not_available(handle, bitrate))?;
        let url = format!(
            "{}/{}/{}",
            state.base_url(),
            directory,
            segment_file.trim_start_matches('/')
        );
        debug!("Segment {} -> {}", segment_file, url);

        let token = self.auth.ensure_valid_token().await?;
        Ok(self.api.fetch_binary(&token, &url).await?)
    }

    /// Key material of the stream; `key` is still base64
    pub async fn get_key(&self, handle: &StreamHandle) -> Result<PlaybackKey> {
        let key_id = match handle.entity_type() {
            LINEAR_CHANNEL_TYPE => key_id_for(LINEAR_CHANNEL_TYPE, ""),
            other => key_id_for(other, &handle.stream_id().await?),
        };

        let token = self.auth.ensure_valid_token().await?;
        Ok(self.api.get_playback_key(&token, &key_id).await?)
    }
}

fn playlist_url<'a>(
    handle: &StreamHandle,
    state: &'a StreamState,
    bitrate: Bitrate,
) -> Result<&'a str> {
    state
        .playlist_url(bitrate)
        .ok_or_else(|| not_available(handle, bitrate))
}

fn not_available(handle: &StreamHandle, bitrate: Bitrate) -> Error {
    Error::NotAvailable {
        entity_type: handle.entity_type().to_string(),
        entity_id: handle.entity_id().to_string(),
        bitrate,
    }
}
