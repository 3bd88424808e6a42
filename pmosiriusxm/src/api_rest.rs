//! Endpoints HTTP du proxy SiriusXM
//!
//! - `GET /channels` et `GET /library` : catalogue en JSON
//! - `GET /stream/{type}/{id}/playlist.m3u8` : playlist dont les clés pointent
//!   vers le proxy, avec un nouveau tune à chaque requête
//! - `GET /stream/{type}/{id}/key` : clé AES décodée
//! - `GET /stream/{type}/{id}/{segment}.aac` : segment audio

use crate::client::SiriusXmClient;
use crate::error::Error;
use crate::models::{Bitrate, Channel};
use crate::rewrite::{rewrite_playlist, StreamRoute};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, warn};

pub const PLAYLIST_CONTENT_TYPE: &str = "application/x-mpegURL";
pub const KEY_CONTENT_TYPE: &str = "application/octet-stream";
pub const SEGMENT_CONTENT_TYPE: &str = "audio/aac";

/// État partagé des handlers
#[derive(Clone)]
pub struct SiriusXmState {
    pub client: SiriusXmClient,
    /// Débit servi pour les playlists et segments
    pub bitrate: Bitrate,
}

impl SiriusXmState {
    pub fn new(client: SiriusXmClient, bitrate: Bitrate) -> Self {
        Self { client, bitrate }
    }
}

/// Crée le router Axum du proxy
pub fn create_router(state: SiriusXmState) -> Router {
    Router::new()
        .route("/channels", get(get_channels))
        .route("/library", get(get_library))
        .route("/stream/{*path}", get(get_stream_resource))
        .with_state(state)
}

// ============ Handlers ============

async fn get_channels(State(state): State<SiriusXmState>) -> Result<Json<Vec<Channel>>, AppError> {
    let channels = state.client.get_channels().await?;
    Ok(Json(channels))
}

async fn get_library(State(state): State<SiriusXmState>) -> Result<Json<Vec<Value>>, AppError> {
    let library = state.client.get_library().await?;
    Ok(Json(library))
}

async fn get_stream_resource(
    State(state): State<SiriusXmState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let route = StreamRoute::from_path(&path).ok_or_else(|| AppError::NotFound(path.clone()))?;
    debug!("Stream request {:?}", route);

    let client = &state.client;
    let response = match route {
        StreamRoute::Playlist {
            entity_type,
            entity_id,
        } => {
            let playlist = client
                .get_live_playlist(&entity_type, &entity_id, state.bitrate)
                .await?;
            let body = rewrite_playlist(&playlist, &entity_type, &entity_id)?;
            ([(header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE)], body).into_response()
        }
        StreamRoute::Key {
            entity_type,
            entity_id,
        } => {
            let key = client.get_key_bytes(&entity_type, &entity_id).await?;
            ([(header::CONTENT_TYPE, KEY_CONTENT_TYPE)], key).into_response()
        }
        StreamRoute::Segment {
            entity_type,
            entity_id,
            segment_file,
        } => {
            let segment = client
                .get_segment(&entity_type, &entity_id, &segment_file, state.bitrate)
                .await?;
            ([(header::CONTENT_TYPE, SEGMENT_CONTENT_TYPE)], segment).into_response()
        }
    };

    Ok(response)
}

// ============ Error handling ============

/// Erreur renvoyée par les handlers
#[derive(Debug)]
pub enum AppError {
    /// Chemin qui ne correspond à aucune ressource de flux
    NotFound(String),
    Client(Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Client(Error::NotAvailable { .. }) => StatusCode::NOT_FOUND,
            AppError::Client(Error::Authentication(_)) => StatusCode::UNAUTHORIZED,
            AppError::Client(Error::Transport(_)) => StatusCode::BAD_GATEWAY,
            AppError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(path) => format!("No stream resource at {}", path),
            AppError::Client(e) => e.to_string(),
        };

        if status.is_server_error() {
            warn!("Proxy request failed ({}): {}", status, message);
        }

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self::Client(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthenticationError, TransportCause, TransportError};

    #[test]
    fn test_error_statuses() {
        let not_available = AppError::from(Error::NotAvailable {
            entity_type: "channel-linear".into(),
            entity_id: "1".into(),
            bitrate: Bitrate::K96,
        });
        assert_eq!(not_available.status(), StatusCode::NOT_FOUND);

        let auth = AppError::from(AuthenticationError::new("user has no password set"));
        assert_eq!(auth.status(), StatusCode::UNAUTHORIZED);

        let transport = AppError::from(TransportError::new(
            "https://cdn/x.aac",
            TransportCause::Status(StatusCode::FORBIDDEN),
        ));
        assert_eq!(transport.status(), StatusCode::BAD_GATEWAY);

        let other = AppError::from(Error::other("boom"));
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }
}
