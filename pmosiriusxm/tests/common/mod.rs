//! Shared mockito fixtures for the SiriusXM tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use pmosiriusxm::{Credentials, SiriusXmClient};
use serde_json::json;
use std::time::Duration;

pub const USERNAME: &str = "listener@example.com";
pub const PASSWORD: &str = "hunter2";
pub const FUTURE: &str = "2099-01-01T00:00:00.000Z";
pub const PAST: &str = "2001-01-01T00:00:00.000Z";

pub fn credentials() -> Credentials {
    Credentials::new(USERNAME, PASSWORD)
}

/// Client whose API and web base URLs both point at the mock server
pub fn client_for(server: &ServerGuard) -> SiriusXmClient {
    SiriusXmClient::builder()
        .api_base_url(server.url())
        .web_base_url(server.url())
        .timeout(Duration::from_secs(5))
        .build(credentials())
        .unwrap()
}

pub struct AuthMocks {
    pub device: Mock,
    pub anonymous: Mock,
    pub identity: Mock,
    pub password: Mock,
    pub authenticated: Mock,
}

impl AuthMocks {
    pub async fn assert_all(&self) {
        self.device.assert_async().await;
        self.anonymous.assert_async().await;
        self.identity.assert_async().await;
        self.password.assert_async().await;
        self.authenticated.assert_async().await;
    }
}

pub async fn mock_device(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/device/v1/devices")
        .match_body(Matcher::PartialJson(json!({"devicePlatform": "web-desktop"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"grant": "device-grant"}"#)
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_anonymous(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/session/v1/sessions/anonymous")
        .match_header("authorization", "Bearer device-grant")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken": "anonymous-token"}"#)
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_identity(server: &mut ServerGuard, has_password: bool, hits: usize) -> Mock {
    server
        .mock("GET", "/identity/v1/identities/status")
        .match_query(Matcher::UrlEncoded("handle".into(), USERNAME.into()))
        .match_header("authorization", "Bearer anonymous-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"hasPassword": has_password, "handle": USERNAME}).to_string())
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_password(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/identity/v1/identities/authenticate/password")
        .match_header("authorization", "Bearer anonymous-token")
        .match_body(Matcher::Json(json!({"handle": USERNAME, "password": PASSWORD})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"grant": "auth-grant"}"#)
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_authenticated(
    server: &mut ServerGuard,
    token: &str,
    expires_at: &str,
    hits: usize,
) -> Mock {
    server
        .mock("POST", "/session/v1/sessions/authenticated")
        .match_header("authorization", "Bearer auth-grant")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"accessToken": token, "accessTokenExpiresAt": expires_at}).to_string())
        .expect(hits)
        .create_async()
        .await
}

/// Whole chain, each step expected `runs` times (device once)
pub async fn mock_auth_chain(
    server: &mut ServerGuard,
    token: &str,
    expires_at: &str,
    runs: usize,
) -> AuthMocks {
    AuthMocks {
        device: mock_device(server, 1).await,
        anonymous: mock_anonymous(server, runs).await,
        identity: mock_identity(server, true, runs).await,
        password: mock_password(server, runs).await,
        authenticated: mock_authenticated(server, token, expires_at, runs).await,
    }
}

pub async fn mock_player_page(server: &mut ServerGuard, token: &str) -> Mock {
    server
        .mock("GET", "/player")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(
            r#"<html><head></head><body>
<script id="hydrated_data" type="application/json">{"config": {"apiEnv": "prod"}, "i18n": {}}</script>
</body></html>"#,
        )
        .create_async()
        .await
}

/// Bitrate-index manifest offering 256k and 64k only
pub const MANIFEST: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=281600,CODECS=\"mp4a.40.2\"\n\
9450_256k_full_v3/9450_256k_full_v3.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=70400,CODECS=\"mp4a.40.5\"\n\
9450_64k_full_v3/9450_64k_full_v3.m3u8\n";

pub const PLAYLIST: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:10\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"https://api.example.com/playback/key/v1/00000000-0000-0000-0000-000000000000\"\n\
#EXTINF:10,\n\
9450_256k_1_000001.aac\n";

pub const KEY_BASE64: &str = "AAECAwQFBgcICQoLDA0ODw==";

/// Tune source for `entity_id` whose manifest lives on the mock server
pub async fn mock_tune_source(
    server: &mut ServerGuard,
    entity_type: &str,
    entity_id: &str,
    stream_id: &str,
    hits: usize,
) -> Mock {
    let manifest_url = format!("{}/AAC_Data/{}/{}_variant.m3u8", server.url(), entity_id, entity_id);
    server
        .mock("POST", "/playback/play/v1/tuneSource")
        .match_header("authorization", "Bearer session-token")
        .match_body(Matcher::PartialJson(json!({
            "id": entity_id,
            "type": entity_type,
            "hlsVersion": "V3",
            "manifestVariant": "FULL",
            "mtcVersion": "V2",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "streams": [{
                    "id": stream_id,
                    "urls": [{"url": manifest_url}]
                }]
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_manifest(server: &mut ServerGuard, entity_id: &str, hits: usize) -> Mock {
    server
        .mock(
            "GET",
            format!("/AAC_Data/{}/{}_variant.m3u8", entity_id, entity_id).as_str(),
        )
        .match_header("authorization", "Bearer session-token")
        .with_status(200)
        .with_header("content-type", "application/x-mpegURL")
        .with_body(MANIFEST)
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_playlist_256k(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/AAC_Data/9450/9450_256k_full_v3/9450_256k_full_v3.m3u8")
        .with_status(200)
        .with_header("content-type", "application/vnd.apple.mpegurl")
        .with_body(PLAYLIST)
        .create_async()
        .await
}

pub async fn mock_key(server: &mut ServerGuard, key_id: &str, hits: usize) -> Mock {
    server
        .mock("GET", format!("/playback/key/v1/{}", key_id).as_str())
        .match_header("authorization", "Bearer session-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"key": KEY_BASE64, "keyId": key_id}).to_string())
        .expect(hits)
        .create_async()
        .await
}
