//! Playback endpoints: tune source and key material

use super::SxmApi;
use crate::error::TransportError;
use crate::models::{PlaybackKey, TuneSource};
use serde_json::json;

/// HLS protocol revision requested from the tune endpoint
pub const HLS_VERSION: &str = "V3";
pub const MANIFEST_VARIANT: &str = "FULL";
pub const MTC_VERSION: &str = "V2";

impl SxmApi {
    /// Requests the tune-source descriptor of an entity
    pub async fn create_tune_source(
        &self,
        token: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<TuneSource, TransportError> {
        let url = self.api_url("/playback/play/v1/tuneSource");
        let body = json!({
            "id": entity_id,
            "type": entity_type,
            "hlsVersion": HLS_VERSION,
            "manifestVariant": MANIFEST_VARIANT,
            "mtcVersion": MTC_VERSION,
        });
        self.post_json(&url, Some(token), &body).await
    }

    /// Fetches the key material for `key_id`
    pub async fn get_playback_key(
        &self,
        token: &str,
        key_id: &str,
    ) -> Result<PlaybackKey, TransportError> {
        let url = self.api_url(&format!("/playback/key/v1/{}", key_id));
        self.get_json(&url, Some(token), &[]).await
    }

    /// Text document hosted on the CDN (manifest or playlist)
    pub async fn fetch_document(&self, token: &str, url: &str) -> Result<String, TransportError> {
        self.get_text(url, Some(token)).await
    }

    /// Binary resource hosted on the CDN (audio segment)
    pub async fn fetch_binary(&self, token: &str, url: &str) -> Result<Vec<u8>, TransportError> {
        self.get_bytes(url, Some(token)).await
    }
}
