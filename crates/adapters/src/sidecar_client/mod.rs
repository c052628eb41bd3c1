// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited JSON-over-Unix-socket client for talking to a sidecar.
//!
//! Every request is one JSON object terminated by `\n`; the response is one
//! JSON object terminated by `\n`. The client opens, sends, reads one line,
//! and closes — there is no persistent connection at this layer (that's
//! what `ResilientTransport` is for, and it observes the host's own client
//! stdio stream, not this socket).

mod unix_impl;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSidecarClient;

pub use unix_impl::UnixSidecarClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use std::path::Path;
use std::time::Duration;

/// The well-known query CoT sidecars answer with any non-error JSON.
pub const COT_HEALTH_CHECK_QUERY: &str = "__health_check__";

#[derive(Debug, Error)]
pub enum SidecarClientError {
    #[error("socket {0} does not exist")]
    NoSocket(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request evicted from a full pending queue")]
    QueueOverflow,
    #[error("write failed: {0}")]
    Write(String),
    #[error("read failed: {0}")]
    Read(String),
    #[error("response was not valid JSON: {0}")]
    InvalidJson(String),
    #[error("sidecar reported an error: {0}")]
    SidecarError(String),
}

#[async_trait]
pub trait SidecarClient: Clone + Send + Sync + 'static {
    /// Send one JSON request and return the parsed response, or
    /// `SidecarClientError::SidecarError` if the response carries an
    /// `"error"` field.
    async fn request(&self, socket_path: &Path, payload: Value, timeout: Duration) -> Result<Value, SidecarClientError>;
}

/// Build the embedding sidecar's health request.
pub fn embedding_health_request() -> Value {
    serde_json::json!({ "type": "health" })
}

/// Build the embedding sidecar's keepalive (KYS) request.
pub fn embedding_keepalive_request(text: &str) -> Value {
    serde_json::json!({ "type": "kys", "text": text })
}

/// Build the embedding sidecar's embedding-generation request.
pub fn embedding_generate_request(text: &str) -> Value {
    serde_json::json!({ "text": text })
}

/// Build the embedding sidecar's dimension-query request.
pub fn embedding_dimension_request() -> Value {
    serde_json::json!({ "type": "get_dimension" })
}

/// Build the CoT sidecar's well-known health-check request.
pub fn cot_health_request() -> Value {
    serde_json::json!({ "type": COT_HEALTH_CHECK_QUERY })
}

/// Whether a parsed response carries an `"error"` field — the one
/// authoritative unhealthy signal across all accepted response shapes.
pub fn response_has_error(response: &Value) -> bool {
    response.get("error").is_some()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
