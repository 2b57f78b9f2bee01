//! Contract tests for volume resolution and the location cache.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/dir/lookup` | `resolve_*`, `file_url*`, `volume_*` |

use weedo_client::{FileId, Location, TransportError, VolumeId, WeedClient, WeedConfig, WeedError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(master: &MockServer) -> WeedClient {
    WeedClient::new(WeedConfig::new(&master.uri()).unwrap()).unwrap()
}

fn lookup_reply() -> serde_json::Value {
    serde_json::json!({
        "volumeId": "7",
        "locations": [
            {"url": "10.0.0.1:8080", "publicUrl": "pub1.example.com:8080"},
            {"url": "10.0.0.2:8080", "publicUrl": "pub2.example.com:8080"}
        ]
    })
}

#[tokio::test]
async fn resolve_normalizes_and_orders_locations() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .and(query_param("volumeId", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_reply()))
        .expect(1)
        .mount(&master)
        .await;

    let client = test_client(&master);
    let locations = client.resolve(VolumeId::new(7), None).await.unwrap();
    assert_eq!(
        locations,
        vec![
            Location::new("http://10.0.0.1:8080", "http://pub1.example.com:8080"),
            Location::new("http://10.0.0.2:8080", "http://pub2.example.com:8080"),
        ]
    );
}

#[tokio::test]
async fn resolve_cache_hit_avoids_network() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_reply()))
        .expect(1)
        .mount(&master)
        .await;

    let client = test_client(&master);
    let first = client.resolve(VolumeId::new(7), None).await.unwrap();
    let second = client.resolve(VolumeId::new(7), None).await.unwrap();
    assert_eq!(first, second);

    let requests = master.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "second resolve must be served from cache");
}

#[tokio::test]
async fn resolve_after_invalidate_asks_master_again() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_reply()))
        .expect(2)
        .mount(&master)
        .await;

    let client = test_client(&master);
    client.resolve(VolumeId::new(7), None).await.unwrap();
    assert!(client.invalidate(VolumeId::new(7)));
    client.resolve(VolumeId::new(7), None).await.unwrap();
}

#[tokio::test]
async fn resolve_passes_collection_hint() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .and(query_param("volumeId", "7"))
        .and(query_param("collection", "pictures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_reply()))
        .expect(1)
        .mount(&master)
        .await;

    let client = test_client(&master);
    client
        .resolve(VolumeId::new(7), Some("pictures"))
        .await
        .unwrap();
}

#[tokio::test]
async fn resolve_server_error_is_lookup_failure_and_not_cached() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"volumeId": "9", "error": "volume id 9 not found"})),
        )
        .expect(2)
        .mount(&master)
        .await;

    let client = test_client(&master);
    for _ in 0..2 {
        let err = client.resolve(VolumeId::new(9), None).await.unwrap_err();
        match err {
            WeedError::Lookup { volume_id, source } => {
                assert_eq!(volume_id, VolumeId::new(9));
                assert_eq!(source.server_message(), Some("volume id 9 not found"));
            }
            other => panic!("expected Lookup, got: {other:?}"),
        }
    }
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn resolve_zero_locations_is_no_location_available() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"volumeId": "4", "locations": []})),
        )
        .mount(&master)
        .await;

    let client = test_client(&master);
    let err = client.resolve(VolumeId::new(4), None).await.unwrap_err();
    assert!(matches!(err, WeedError::NoLocationAvailable(v) if v == VolumeId::new(4)));
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn resolve_garbage_body_is_deserialization_failure() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&master)
        .await;

    let client = test_client(&master);
    let err = client.resolve(VolumeId::new(4), None).await.unwrap_err();
    assert!(matches!(
        err,
        WeedError::Lookup {
            source: TransportError::Deserialization { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn concurrent_resolves_share_the_cache() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_reply()))
        .expect(1)
        .mount(&master)
        .await;

    let client = test_client(&master);
    client.resolve(VolumeId::new(7), None).await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.resolve(VolumeId::new(7), None).await })
        })
        .collect();
    for task in tasks {
        let locations = task.await.unwrap().unwrap();
        assert_eq!(locations.len(), 2);
    }
}

#[tokio::test]
async fn volume_accepts_bare_id_or_file_id() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .and(query_param("volumeId", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_reply()))
        .expect(1)
        .mount(&master)
        .await;

    let client = test_client(&master);
    let by_id = client.volume("7", None).await.unwrap();
    let by_fid = client.volume("7,01637037d6", None).await.unwrap();
    assert_eq!(by_id.public_url(), "http://pub1.example.com:8080");
    assert_eq!(by_fid.locations().count(), 2);

    let err = client.volume("7,short", None).await.unwrap_err();
    assert!(matches!(err, WeedError::MalformedIdentifier(_)));
}

#[tokio::test]
async fn file_urls_cover_every_replica() {
    let master = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_reply()))
        .mount(&master)
        .await;

    let client = test_client(&master);
    let fid: FileId = "7,0000000a0000cafe".parse().unwrap();

    let primary = client.file_url(&fid, None).await.unwrap();
    assert_eq!(primary.public_url, "http://pub1.example.com:8080/7,0000000a0000cafe");
    assert_eq!(primary.url, "http://10.0.0.1:8080/7,0000000a0000cafe");

    let all = client.file_urls(&fid, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].url, "http://10.0.0.2:8080/7,0000000a0000cafe");
}
