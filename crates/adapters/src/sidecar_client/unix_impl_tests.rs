// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sidecar_client::embedding_health_request;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

async fn serve_once(listener: UnixListener, response: Value) {
    let (stream, _) = listener.accept().await.unwrap_or_else(|e| panic!("accept: {e}"));
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap_or_else(|e| panic!("read: {e}"));
    let mut out = serde_json::to_string(&response).unwrap_or_else(|e| panic!("serialize: {e}"));
    out.push('\n');
    write_half.write_all(out.as_bytes()).await.unwrap_or_else(|e| panic!("write: {e}"));
}

#[tokio::test]
async fn request_returns_parsed_response_on_success() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let socket_path = dir.path().join("embeddings.sock");
    let listener = UnixListener::bind(&socket_path).unwrap_or_else(|e| panic!("bind: {e}"));

    let response = serde_json::json!({"status": "healthy", "native_dimensions": 384});
    let server = tokio::spawn(serve_once(listener, response.clone()));

    let client = UnixSidecarClient::new();
    let result = client
        .request(&socket_path, embedding_health_request(), Duration::from_secs(1))
        .await
        .unwrap_or_else(|e| panic!("request: {e}"));

    assert_eq!(result, response);
    server.await.unwrap_or_else(|e| panic!("server task: {e}"));
}

#[tokio::test]
async fn request_surfaces_sidecar_error_field() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let socket_path = dir.path().join("embeddings.sock");
    let listener = UnixListener::bind(&socket_path).unwrap_or_else(|e| panic!("bind: {e}"));

    let server = tokio::spawn(serve_once(listener, serde_json::json!({"error": "model not loaded"})));

    let client = UnixSidecarClient::new();
    let result = client
        .request(&socket_path, embedding_health_request(), Duration::from_secs(1))
        .await;

    assert!(matches!(result, Err(SidecarClientError::SidecarError(_))));
    server.await.unwrap_or_else(|e| panic!("server task: {e}"));
}

#[tokio::test]
async fn request_to_missing_socket_is_no_socket() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let socket_path = dir.path().join("never-created.sock");
    let client = UnixSidecarClient::new();
    let result = client
        .request(&socket_path, embedding_health_request(), Duration::from_secs(1))
        .await;
    assert!(matches!(result, Err(SidecarClientError::NoSocket(_))));
}
