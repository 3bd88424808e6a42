//! Local proxy paths and playlist key rewriting

use crate::error::Result;
use regex::{NoExpand, Regex};

/// Local path serving the decryption key of an entity
pub fn key_path(entity_type: &str, entity_id: &str) -> String {
    format!("/stream/{}/{}/key", entity_type, entity_id)
}

/// Local path serving the rewritten playlist of an entity
pub fn playlist_path(entity_type: &str, entity_id: &str) -> String {
    format!("/stream/{}/{}/playlist.m3u8", entity_type, entity_id)
}

/// Points every AES-128 key URI of a playlist at the local key route
///
/// Only the quoted URI value of `#EXT-X-KEY:METHOD=AES-128,URI="..."` is
/// replaced; any other byte of the document is kept.
pub fn rewrite_playlist(playlist: &str, entity_type: &str, entity_id: &str) -> Result<String> {
    let re = Regex::new(r#"#EXT-X-KEY:METHOD=AES-128,URI="(.+?)""#)?;
    let replacement = format!(
        r#"#EXT-X-KEY:METHOD=AES-128,URI="{}""#,
        key_path(entity_type, entity_id)
    );
    Ok(re
        .replace_all(playlist, NoExpand(&replacement))
        .into_owned())
}

/// Local request decoded from its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRoute {
    Playlist {
        entity_type: String,
        entity_id: String,
    },
    Key {
        entity_type: String,
        entity_id: String,
    },
    Segment {
        entity_type: String,
        entity_id: String,
        segment_file: String,
    },
}

impl StreamRoute {
    /// Parses `/stream/{type}/{id}/...`; `None` for anything else
    ///
    /// The leading `/stream/` is optional so the function also accepts the
    /// remainder captured by a nested router.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_start_matches('/');
        let path = path.strip_prefix("stream/").unwrap_or(path);

        let mut parts = path.splitn(3, '/');
        let entity_type = parts.next().filter(|s| !s.is_empty())?.to_string();
        let entity_id = parts.next().filter(|s| !s.is_empty())?.to_string();
        let rest = parts.next()?;

        match rest {
            "playlist.m3u8" => Some(StreamRoute::Playlist {
                entity_type,
                entity_id,
            }),
            "key" => Some(StreamRoute::Key {
                entity_type,
                entity_id,
            }),
            file if file.len() > ".aac".len() && file.ends_with(".aac") => {
                Some(StreamRoute::Segment {
                    entity_type,
                    entity_id,
                    segment_file: file.to_string(),
                })
            }
            _ => None,
        }
    }

    pub fn entity_type(&self) -> &str {
        match self {
            StreamRoute::Playlist { entity_type, .. }
            | StreamRoute::Key { entity_type, .. }
            | StreamRoute::Segment { entity_type, .. } => entity_type,
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            StreamRoute::Playlist { entity_id, .. }
            | StreamRoute::Key { entity_id, .. }
            | StreamRoute::Segment { entity_id, .. } => entity_id,
        }
    }
}
