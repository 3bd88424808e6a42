//! Stream resolution and playback tests
//!
//! Manifest scanning, bitrate availability, segment and key routing, and
//! single initialization per entity.

mod common;

use common::*;
use mockito::{Matcher, Server};
use pmosiriusxm::{Bitrate, Error};
use std::sync::Arc;

#[tokio::test]
async fn test_initialize_maps_only_offered_bitrates() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let tune = mock_tune_source(&mut server, "channel-linear", "9450", "stream-9450", 1).await;
    let manifest = mock_manifest(&mut server, "9450", 1).await;

    let client = client_for(&server);
    let handle = client.get_stream("channel-linear", "9450").await.unwrap();

    tune.assert_async().await;
    manifest.assert_async().await;

    let base = format!("{}/AAC_Data/9450", server.url());
    let map = handle.streams_by_bitrate().await.unwrap();
    assert_eq!(
        map.get(Bitrate::K256),
        Some(format!("{}/9450_256k_full_v3/9450_256k_full_v3.m3u8", base).as_str())
    );
    assert_eq!(map.get(Bitrate::K96), None);
    assert_eq!(
        map.get(Bitrate::K64),
        Some(format!("{}/9450_64k_full_v3/9450_64k_full_v3.m3u8", base).as_str())
    );
    assert_eq!(map.get(Bitrate::K32), None);

    assert_eq!(handle.stream_id().await.unwrap(), "stream-9450");
    assert_eq!(handle.base_url().await.unwrap(), base);
    assert_eq!(
        handle.streams_by_bitrate_url().await.unwrap(),
        format!("{}/9450_variant.m3u8", base)
    );
}

#[tokio::test]
async fn test_manifest_without_any_bitrate_still_initializes() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let _tune = mock_tune_source(&mut server, "channel-linear", "1", "stream-1", 1).await;
    let _manifest = server
        .mock("GET", "/AAC_Data/1/1_variant.m3u8")
        .with_status(200)
        .with_header("content-type", "application/x-mpegURL")
        .with_body("#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\nother_128k.m3u8\n")
        .create_async()
        .await;

    let client = client_for(&server);
    let handle = client.get_stream("channel-linear", "1").await.unwrap();

    assert!(handle.is_initialized().await);
    assert!(handle.streams_by_bitrate().await.unwrap().available().is_empty());
}

#[tokio::test]
async fn test_tune_failure_leaves_handle_uninitialized() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let tune = server
        .mock("POST", "/playback/play/v1/tuneSource")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.get_stream("channel-linear", "9450").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    tune.assert_async().await;

    let handle = client.resolver().handle("channel-linear", "9450").await;
    assert!(!handle.is_initialized().await);
}

#[tokio::test]
async fn test_get_playlist_respects_bitrate_availability() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let _tune = mock_tune_source(&mut server, "channel-linear", "9450", "stream-9450", 1).await;
    let _manifest = mock_manifest(&mut server, "9450", 1).await;
    let playlist = mock_playlist_256k(&mut server).await;

    let client = client_for(&server);

    let err = client
        .get_playlist("channel-linear", "9450", Bitrate::K96)
        .await
        .unwrap_err();
    assert!(err.is_not_available());
    assert!(matches!(
        err,
        Error::NotAvailable { bitrate: Bitrate::K96, .. }
    ));

    let text = client
        .get_playlist("channel-linear", "9450", Bitrate::K256)
        .await
        .unwrap();
    assert_eq!(text, PLAYLIST);
    playlist.assert_async().await;
}

#[tokio::test]
async fn test_live_playlist_refreshes_stream_each_call() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let tune = mock_tune_source(&mut server, "channel-linear", "9450", "stream-9450", 2).await;
    let manifest = mock_manifest(&mut server, "9450", 2).await;
    let playlist = server
        .mock("GET", "/AAC_Data/9450/9450_256k_full_v3/9450_256k_full_v3.m3u8")
        .with_status(200)
        .with_header("content-type", "application/vnd.apple.mpegurl")
        .with_body(PLAYLIST)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    for _ in 0..2 {
        let text = client
            .get_live_playlist("channel-linear", "9450", Bitrate::K256)
            .await
            .unwrap();
        assert_eq!(text, PLAYLIST);
    }
    assert_eq!(client.resolver().len().await, 1);

    tune.assert_async().await;
    manifest.assert_async().await;
    playlist.assert_async().await;
}

#[tokio::test]
async fn test_get_segment_uses_bitrate_directory() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let _tune = mock_tune_source(&mut server, "channel-linear", "9450", "stream-9450", 1).await;
    let _manifest = mock_manifest(&mut server, "9450", 1).await;
    let segment = server
        .mock("GET", "/AAC_Data/9450/9450_64k_full_v3/9450_64k_1_000001.aac")
        .match_header("authorization", "Bearer session-token")
        .with_status(200)
        .with_header("content-type", "audio/aac")
        .with_body(vec![0xffu8, 0xf1, 0x50, 0x80])
        .create_async()
        .await;

    let client = client_for(&server);
    let bytes = client
        .get_segment("channel-linear", "9450", "9450_64k_1_000001.aac", Bitrate::K64)
        .await
        .unwrap();

    assert_eq!(bytes, vec![0xff, 0xf1, 0x50, 0x80]);
    segment.assert_async().await;

    let err = client
        .get_segment("channel-linear", "9450", "9450_32k_1_000001.aac", Bitrate::K32)
        .await
        .unwrap_err();
    assert!(err.is_not_available());
}

#[tokio::test]
async fn test_linear_channel_key_uses_nil_uuid() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let _tune = mock_tune_source(&mut server, "channel-linear", "9450", "stream-9450", 1).await;
    let _manifest = mock_manifest(&mut server, "9450", 1).await;
    let key = mock_key(&mut server, "00000000-0000-0000-0000-000000000000", 2).await;

    let client = client_for(&server);
    let playback_key = client.get_key("channel-linear", "9450").await.unwrap();

    assert_eq!(playback_key.key, KEY_BASE64);
    assert_eq!(
        client.get_key_bytes("channel-linear", "9450").await.unwrap(),
        (0u8..16).collect::<Vec<_>>()
    );
    key.assert_async().await;
}

#[tokio::test]
async fn test_on_demand_key_uses_stream_id() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let _tune = mock_tune_source(&mut server, "episode-podcast", "ep-1", "stream-ep-1", 1).await;
    let _manifest = mock_manifest(&mut server, "ep-1", 1).await;
    let nil_key = mock_key(&mut server, "00000000-0000-0000-0000-000000000000", 0).await;
    let key = mock_key(&mut server, "stream-ep-1", 1).await;

    let client = client_for(&server);
    client.get_key("episode-podcast", "ep-1").await.unwrap();

    key.assert_async().await;
    nil_key.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_resolution_tunes_once() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let tune = mock_tune_source(&mut server, "channel-linear", "9450", "stream-9450", 1).await;
    let manifest = mock_manifest(&mut server, "9450", 1).await;

    let client = client_for(&server);
    let (a, b) = tokio::join!(
        client.get_stream("channel-linear", "9450"),
        client.get_stream("channel-linear", "9450")
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert!(b.is_initialized().await);
    assert_eq!(client.resolver().len().await, 1);

    tune.assert_async().await;
    manifest.assert_async().await;
}

#[tokio::test]
async fn test_forced_initialize_reruns_tune() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let tune = mock_tune_source(&mut server, "channel-linear", "9450", "stream-9450", 2).await;
    let manifest = mock_manifest(&mut server, "9450", 2).await;

    let client = client_for(&server);
    let handle = client.get_stream("channel-linear", "9450").await.unwrap();
    client.resolver().initialize(&handle).await.unwrap();

    tune.assert_async().await;
    manifest.assert_async().await;
}

#[tokio::test]
async fn test_podcast_episodes_and_channels() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth_chain(&mut server, "session-token", FUTURE, 1).await;
    let episodes = server
        .mock("GET", "/relationship/v1/container/aod")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("entityType".into(), "show-podcast".into()),
            Matcher::UrlEncoded("entityId".into(), "show-7".into()),
            Matcher::UrlEncoded("maxResponses".into(), "1000".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"container": {"sets": [{"items": [
                {"entity": {"id": "ep-1", "type": "episode-podcast"}},
                {"entity": {"id": "ep-2", "type": "episode-podcast"}}
            ]}]}}"#,
        )
        .create_async()
        .await;
    let channels = server
        .mock("GET", "/relationship/v1/container/all-channels")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"container": {"sets": [{"items": [{
                "decorations": {"channelNumber": "2", "unentitled": false},
                "entity": {
                    "id": "9450", "type": "channel-linear",
                    "texts": {"title": {"default": "Hits 1"}, "description": {"default": "Pop"}},
                    "images": {}
                }
            }]}]}}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);

    let eps = client.get_podcast_episodes("show-7").await.unwrap();
    assert_eq!(eps.len(), 2);
    assert_eq!(eps[1]["id"], "ep-2");
    episodes.assert_async().await;

    let list = client.get_channels().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "Hits 1");
    assert_eq!(list[0].title_short, None);
    channels.assert_async().await;
}
