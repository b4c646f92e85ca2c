//! Integration tests for the demo servers.
//!
//! Each test binds a real listener on an ephemeral port and talks to it
//! over HTTP.

use std::net::SocketAddr;

use pretty_assertions::assert_eq;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tempfile::TempDir;

use route_demos::api::{create_hello_world_router, create_upload_router, Variant};
use route_demos::server;
use route_demos::upload::{FileStore, UploadState};

/// Serve `router` in the background and return its address.
async fn spawn(router: axum::Router) -> SocketAddr {
    let listener = server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn spawn_upload(dir: &TempDir) -> SocketAddr {
    let state = UploadState::new(FileStore::new(dir.path()), 1024 * 1024);
    spawn(create_upload_router(state).unwrap()).await
}

#[tokio::test]
async fn test_ping_over_http() {
    let addr = spawn(create_hello_world_router(Variant::Basic).unwrap()).await;

    let response = reqwest::get(format!("http://{addr}/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "message": "pong" }));
}

#[tokio::test]
async fn test_chained_variant_serves_both_pings() {
    let addr = spawn(create_hello_world_router(Variant::Chained).unwrap()).await;
    let client = reqwest::Client::new();

    for (path, message) in [("/ping", "pong"), ("/pingping", "pongpong")] {
        let body: serde_json::Value = client
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn test_placeholder_routes_fail_loudly() {
    let addr = spawn(create_hello_world_router(Variant::Basic).unwrap()).await;
    let client = reqwest::Client::new();

    for path in ["/p/anything/here", "/ping/x", "/v1/get"] {
        let response = client
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED, "{path}");
    }
}

#[tokio::test]
async fn test_upload_roundtrip() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_upload(&dir).await;

    let form = Form::new().part("file", Part::bytes(b"hi".to_vec()).file_name("a.txt"));
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "'a.txt' uploaded!");
    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hi");
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_upload(&dir).await;

    let form = Form::new().text("comment", "no file here");
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "missing_field");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_concurrent_uploads_same_name() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_upload(&dir).await;
    let client = reqwest::Client::new();

    let first = vec![b'1'; 64 * 1024];
    let second = vec![b'2'; 32 * 1024];

    let send = |data: Vec<u8>| {
        let client = client.clone();
        async move {
            let form = Form::new().part("file", Part::bytes(data).file_name("same.bin"));
            client
                .post(format!("http://{addr}/upload"))
                .multipart(form)
                .send()
                .await
                .unwrap()
                .status()
        }
    };

    let (a, b) = tokio::join!(send(first.clone()), send(second.clone()));
    assert_eq!(a, StatusCode::OK);
    assert_eq!(b, StatusCode::OK);

    let stored = std::fs::read(dir.path().join("same.bin")).unwrap();
    assert!(stored == first || stored == second);
}
