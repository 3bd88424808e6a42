//! Low-level access to the SiriusXM web API
//!
//! [`SxmApi`] knows how to reach every endpoint but holds no session state:
//! bearer tokens are passed in by the caller. Token lifecycle lives in
//! [`crate::auth::AuthManager`].

pub mod auth;
pub mod catalog;
pub mod playback;

use crate::error::{Error, Result, TransportCause, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Edge gateway hosting session, catalogue and playback endpoints
pub const DEFAULT_API_BASE_URL: &str = "https://api.edge-gateway.siriusxm.com";

/// Web site serving the player page
pub const DEFAULT_WEB_BASE_URL: &str = "https://www.siriusxm.com";

/// Per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";

const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json; charset=utf-8"),
    ("accept-language", "en-US,en;q=0.9"),
    (
        "baggage",
        "sentry-environment=prod,sentry-release=release-sxm-player-7.0",
    ),
    ("content-type", "application/json; charset=UTF-8"),
    ("dnt", "1"),
    ("origin", "https://www.siriusxm.com"),
    ("referer", "https://www.siriusxm.com/"),
    (
        "sec-ch-ua",
        "'Not_A Brand';v='8', 'Chromium';v='120', 'Microsoft Edge';v='120'",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "'macOS'"),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-site"),
    ("x-sxm-clock", "[0,0]"),
    ("x-sxm-platform", "browser"),
    ("x-sxm-tenant", "sxm"),
];

/// Headers sent with every request, mimicking the desktop web player
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &(name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Body of the device registration request
pub fn device_payload() -> Value {
    json!({
        "devicePlatform": "web-desktop",
        "deviceAttributes": {
            "browser": {
                "browserVersion": "120.0.0.0",
                "browser": "Edge",
                "userAgent": USER_AGENT,
                "sdk": "web",
                "app": "web",
                "sdkVersion": "120.0.0.0",
                "appVersion": "120.0.0.0",
            }
        }
    })
}

/// Response body decoded according to its content type
#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl ResponseBody {
    pub fn into_json<T: DeserializeOwned>(self) -> std::result::Result<T, TransportCause> {
        Ok(match self {
            ResponseBody::Json(value) => serde_json::from_value(value)?,
            ResponseBody::Text(text) => serde_json::from_str(&text)?,
            ResponseBody::Binary(bytes) => serde_json::from_slice(&bytes)?,
        })
    }

    pub fn into_text(self) -> std::result::Result<String, TransportCause> {
        Ok(match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text,
            ResponseBody::Binary(bytes) => String::from_utf8(bytes)?,
        })
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ResponseBody::Json(value) => value.to_string().into_bytes(),
            ResponseBody::Text(text) => text.into_bytes(),
            ResponseBody::Binary(bytes) => bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Text,
    Binary,
}

fn body_kind(content_type: &str) -> BodyKind {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime.starts_with("text/") || mime.ends_with("mpegurl") {
        BodyKind::Text
    } else {
        BodyKind::Binary
    }
}

/// Client API bas-niveau pour SiriusXM
#[derive(Debug, Clone)]
pub struct SxmApi {
    client: Client,
    api_base_url: String,
    web_base_url: String,
}

impl SxmApi {
    /// Client with the default base URLs and timeout
    pub fn new() -> Result<Self> {
        Self::with_settings(
            DEFAULT_API_BASE_URL,
            DEFAULT_WEB_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_settings(
        api_base_url: impl Into<String>,
        web_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_base_url = api_base_url.into();
        let client = Client::builder()
            .default_headers(default_headers())
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(TransportError::new(api_base_url.clone(), e)))?;

        Ok(Self::with_client(client, api_base_url, web_base_url))
    }

    /// Uses a caller-provided HTTP client as-is
    pub fn with_client(
        client: Client,
        api_base_url: impl Into<String>,
        web_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            web_base_url: web_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn web_base_url(&self) -> &str {
        &self.web_base_url
    }

    pub(crate) fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base_url, endpoint.trim_start_matches('/'))
    }

    pub(crate) fn web_url(&self, path: &str) -> String {
        format!("{}/{}", self.web_base_url, path.trim_start_matches('/'))
    }

    /// Sends a request and decodes the body by content type
    ///
    /// Non-2xx statuses are errors; nothing is retried.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> std::result::Result<ResponseBody, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::new(url, e))?;

        debug!("{} {}", method, url);

        let mut request = self.client.request(method, parsed);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", url, e);
                TransportError::new(url, e)
            })?;

        self.handle_response(url, response).await
    }

    async fn handle_response(
        &self,
        url: &str,
        response: Response,
    ) -> std::result::Result<ResponseBody, TransportError> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            warn!("API error ({}) for {}", status.as_u16(), url);
            return Err(TransportError::new(url, TransportCause::Status(status)));
        }

        let kind = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(body_kind)
            .unwrap_or(BodyKind::Binary);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(url, e))?
            .to_vec();

        let body = match kind {
            BodyKind::Json => ResponseBody::Json(
                serde_json::from_slice(&bytes).map_err(|e| TransportError::new(url, e))?,
            ),
            BodyKind::Text => ResponseBody::Text(
                String::from_utf8(bytes).map_err(|e| TransportError::new(url, e))?,
            ),
            BodyKind::Binary => ResponseBody::Binary(bytes),
        };

        Ok(body)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, TransportError> {
        self.send(Method::GET, url, bearer, query, None)
            .await?
            .into_json()
            .map_err(|e| TransportError::new(url, e))
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &Value,
    ) -> std::result::Result<T, TransportError> {
        self.send(Method::POST, url, bearer, &[], Some(body))
            .await?
            .into_json()
            .map_err(|e| TransportError::new(url, e))
    }

    pub(crate) async fn get_text(
        &self,
        url: &str,
        bearer: Option<&str>,
    ) -> std::result::Result<String, TransportError> {
        self.send(Method::GET, url, bearer, &[], None)
            .await?
            .into_text()
            .map_err(|e| TransportError::new(url, e))
    }

    pub(crate) async fn get_bytes(
        &self,
        url: &str,
        bearer: Option<&str>,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        Ok(self
            .send(Method::GET, url, bearer, &[], None)
            .await?
            .into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_kind() {
        assert_eq!(body_kind("application/json"), BodyKind::Json);
        assert_eq!(body_kind("application/json; charset=utf-8"), BodyKind::Json);
        assert_eq!(body_kind("text/html; charset=utf-8"), BodyKind::Text);
        assert_eq!(body_kind("application/x-mpegURL"), BodyKind::Text);
        assert_eq!(body_kind("application/vnd.apple.mpegurl"), BodyKind::Text);
        assert_eq!(body_kind("audio/aac"), BodyKind::Binary);
    }

    #[test]
    fn test_urls_trim_slashes() {
        let api = SxmApi::with_client(Client::new(), "http://api.local/", "http://web.local/");
        assert_eq!(
            api.api_url("/device/v1/devices"),
            "http://api.local/device/v1/devices"
        );
        assert_eq!(api.web_url("player"), "http://web.local/player");
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers();
        assert_eq!(headers["x-sxm-tenant"], "sxm");
        assert_eq!(headers["origin"], "https://www.siriusxm.com");
        assert!(!headers.contains_key("authorization"));
    }

    #[test]
    fn test_device_payload() {
        let payload = device_payload();
        assert_eq!(payload["devicePlatform"], "web-desktop");
        assert_eq!(payload["deviceAttributes"]["browser"]["userAgent"], USER_AGENT);
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let api = SxmApi::new().unwrap();
        let err = api.get_text("not a url", None).await.unwrap_err();
        assert!(matches!(err.cause, TransportCause::InvalidUrl(_)));
        assert_eq!(err.url, "not a url");
    }

    #[test]
    fn test_response_body_conversions() {
        let body = ResponseBody::Text("{\"key\":\"abc\"}".into());
        let value: Value = body.into_json().unwrap();
        assert_eq!(value["key"], "abc");

        let body = ResponseBody::Binary(vec![0xff, 0xfe]);
        assert!(matches!(body.into_text(), Err(TransportCause::Utf8(_))));
    }
}
