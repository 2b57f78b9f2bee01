//! Contract tests for the filer client.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/{dir}/` | `dir_*` |
//! | POST   | `/{path}` | `upload_*` |
//! | DELETE | `/{path}` | `delete_*` |

use weedo_client::{WeedClient, WeedConfig, WeedError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(filer: &MockServer) -> WeedClient {
    let config = WeedConfig::local(9333)
        .unwrap()
        .with_filer(&filer.uri())
        .unwrap();
    WeedClient::new(config).unwrap()
}

#[tokio::test]
async fn dir_lists_files_and_subdirectories() {
    let filer = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/text/"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Directory": "/text/",
            "Files": [{"fid": "3,01637037d6", "name": "world.txt"}],
            "Subdirectories": null
        })))
        .expect(1)
        .mount(&filer)
        .await;

    let client = test_client(&filer);
    let dir = client.filers()[0].dir("text").await.unwrap();
    assert_eq!(dir.path, "/text/");
    assert_eq!(dir.files.len(), 1);
    assert_eq!(dir.files[0].name, "world.txt");
    assert!(dir.subdirectories.is_empty());
}

#[tokio::test]
async fn dir_missing_is_filer_error() {
    let filer = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&filer)
        .await;

    let client = test_client(&filer);
    let err = client.filers()[0].dir("/missing").await.unwrap_err();
    match err {
        WeedError::Filer { operation, path, source } => {
            assert_eq!(operation, "list");
            assert_eq!(path, "/missing/");
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("expected Filer, got: {other:?}"),
    }
}

#[tokio::test]
async fn upload_posts_multipart_to_path() {
    let filer = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/text/world.txt"))
        .and(body_string_contains("hello world"))
        .and(body_string_contains("text/plain"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "name": "world.txt",
            "size": 11
        })))
        .expect(1)
        .mount(&filer)
        .await;

    let client = test_client(&filer);
    client.filers()[0]
        .upload("text/world.txt", Some("text/plain"), b"hello world".to_vec())
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_hits_path() {
    let filer = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/text/world.txt"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&filer)
        .await;

    let client = test_client(&filer);
    let f = client.filer(&filer.uri()).unwrap();
    f.delete("text/world.txt").await.unwrap();
}

#[tokio::test]
async fn delete_server_error_is_reported() {
    let filer = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/locked"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "permission denied"})),
        )
        .mount(&filer)
        .await;

    let client = test_client(&filer);
    let err = client.filers()[0].delete("/locked").await.unwrap_err();
    assert_eq!(
        err.transport().and_then(|t| t.server_message()),
        Some("permission denied")
    );
}
