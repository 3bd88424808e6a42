//! Catalogue endpoints: library, channels, podcast episodes, player page

use super::SxmApi;
use crate::error::{Result, TransportError};
use crate::models::{Channel, ContainerResponse, LibraryResponse};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Extracts the JSON embedded in the player page, `{}` when absent
pub fn extract_hydrated_data(html: &str) -> Result<Value> {
    let re = Regex::new(r#"(?s)<script id="hydrated_data" type="application/json">(.*?)</script>"#)?;
    let raw = re
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("{}");

    Ok(serde_json::from_str(raw)?)
}

impl SxmApi {
    /// All library entities (values of `allDataMap`)
    pub async fn get_library(&self, token: &str) -> std::result::Result<Vec<Value>, TransportError> {
        let url = self.api_url("/ondemand/v1/library/all");
        let response: LibraryResponse = self.get_json(&url, Some(token), &[]).await?;
        Ok(response.all_data_map.into_iter().map(|(_, v)| v).collect())
    }

    /// Linear and on-demand channels
    pub async fn get_channels(&self, token: &str) -> std::result::Result<Vec<Channel>, TransportError> {
        let url = self.api_url("/relationship/v1/container/all-channels");
        let response: ContainerResponse = self
            .get_json(
                &url,
                Some(token),
                &[
                    ("entityType", "curated-grouping"),
                    ("entityId", ""),
                    ("offset", "0"),
                    ("size", "1000"),
                ],
            )
            .await?;

        let items = response.into_first_set_items();
        let total = items.len();
        let channels: Vec<Channel> = items.into_iter().filter_map(Channel::from_item).collect();
        if channels.len() < total {
            warn!(
                "Skipped {} channel entries without id, type or title",
                total - channels.len()
            );
        }
        debug!("Fetched {} channels", channels.len());
        Ok(channels)
    }

    /// Episode entities of a podcast show
    pub async fn get_podcast_episodes(
        &self,
        token: &str,
        podcast_entity_id: &str,
    ) -> std::result::Result<Vec<Value>, TransportError> {
        let url = self.api_url("/relationship/v1/container/aod");
        let response: ContainerResponse = self
            .get_json(
                &url,
                Some(token),
                &[
                    ("entityType", "show-podcast"),
                    ("entityId", podcast_entity_id),
                    ("offset", "0"),
                    ("size", "1000"),
                    ("maxResponses", "1000"),
                ],
            )
            .await?;

        Ok(response
            .into_first_set_items()
            .into_iter()
            .map(|item| item.entity)
            .collect())
    }

    /// HTML of the web player page
    pub async fn get_player_page(&self, token: &str) -> std::result::Result<String, TransportError> {
        let url = self.web_url("/player");
        self.get_text(&url, Some(token)).await
    }
}
