// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sidecar_client::embedding_health_request;

#[tokio::test]
async fn default_response_is_ok_when_unconfigured() {
    let client = FakeSidecarClient::new();
    let result = client
        .request(Path::new("/p/embeddings.sock"), embedding_health_request(), Duration::from_secs(1))
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(result["status"], "ok");
}

#[tokio::test]
async fn configured_response_is_returned_for_matching_socket() {
    let client = FakeSidecarClient::new();
    client.set_response("/p/embeddings.sock", serde_json::json!({"native_dimensions": 384}));
    let result = client
        .request(Path::new("/p/embeddings.sock"), embedding_health_request(), Duration::from_secs(1))
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(result["native_dimensions"], 384);
}

#[tokio::test]
async fn error_field_in_configured_response_surfaces_as_sidecar_error() {
    let client = FakeSidecarClient::new();
    client.set_response("/p/embeddings.sock", serde_json::json!({"error": "boom"}));
    let result = client
        .request(Path::new("/p/embeddings.sock"), embedding_health_request(), Duration::from_secs(1))
        .await;
    assert!(matches!(result, Err(SidecarClientError::SidecarError(_))));
}

#[tokio::test]
async fn unreachable_socket_is_no_socket_error() {
    let client = FakeSidecarClient::new();
    client.set_unreachable("/p/embeddings.sock");
    let result = client
        .request(Path::new("/p/embeddings.sock"), embedding_health_request(), Duration::from_secs(1))
        .await;
    assert!(matches!(result, Err(SidecarClientError::NoSocket(_))));
}

#[tokio::test]
async fn requests_are_recorded() {
    let client = FakeSidecarClient::new();
    client
        .request(Path::new("/p/embeddings.sock"), embedding_health_request(), Duration::from_secs(1))
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(client.requests().len(), 1);
}
