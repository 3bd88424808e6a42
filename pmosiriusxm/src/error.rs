//! Error types for the SiriusXM client

use crate::models::Bitrate;
use reqwest::StatusCode;

/// Result type alias for SiriusXM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the SiriusXM client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An upstream HTTP request failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The authentication chain failed
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// The stream has no playlist for the requested bitrate
    #[error("Bitrate {bitrate} not available for {entity_type}/{entity_id}")]
    NotAvailable {
        entity_type: String,
        entity_id: String,
        bitrate: Bitrate,
    },

    /// The stream handle has not been initialized yet
    #[error("Stream {entity_type}/{entity_id} is not initialized")]
    NotInitialized {
        entity_type: String,
        entity_id: String,
    },

    /// The tune source descriptor has no usable stream
    #[error("Invalid tune source for {entity_type}/{entity_id}: {reason}")]
    InvalidTuneSource {
        entity_type: String,
        entity_id: String,
        reason: String,
    },

    /// Username or password could not be found
    #[error("Missing SiriusXM credentials: {0} is not set")]
    MissingCredentials(&'static str),

    /// The key payload is not valid base64
    #[error("Invalid playback key: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    /// Regex error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (from pmoconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// True for the "bitrate not available" condition
    pub fn is_not_available(&self) -> bool {
        matches!(self, Error::NotAvailable { .. })
    }

    /// True when the failure comes from the authentication chain
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Authentication(_))
    }
}

/// Failure at the HTTP layer, with the URL that was requested
#[derive(Debug, thiserror::Error)]
#[error("Error for URL {url}: {cause}")]
pub struct TransportError {
    pub url: String,
    #[source]
    pub cause: TransportCause,
}

impl TransportError {
    pub fn new(url: impl Into<String>, cause: impl Into<TransportCause>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }

    /// HTTP status returned by the upstream, for non-2xx responses
    pub fn status(&self) -> Option<StatusCode> {
        match &self.cause {
            TransportCause::Status(status) => Some(*status),
            TransportCause::Request(e) => e.status(),
            _ => None,
        }
    }
}

/// Underlying cause of a [`TransportError`]
#[derive(Debug, thiserror::Error)]
pub enum TransportCause {
    /// Non-2xx status
    #[error("HTTP status {0}")]
    Status(StatusCode),

    /// Connection failure, timeout, body read failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Malformed URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Body could not be decoded into the expected structure
    #[error("unexpected body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Text body is not UTF-8
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Failure of the authentication chain
///
/// Transport failures of any step are carried as the `cause`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AuthenticationError {
    pub message: String,
    #[source]
    pub cause: Option<TransportError>,
}

impl AuthenticationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: TransportError) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause),
        }
    }
}
