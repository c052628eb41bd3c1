// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sidecar client for testing, keyed by socket path.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{response_has_error, SidecarClient, SidecarClientError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct FakeSidecarClient {
    responses: Arc<Mutex<HashMap<PathBuf, Value>>>,
    requests: Arc<Mutex<Vec<(PathBuf, Value)>>>,
    unreachable: Arc<Mutex<std::collections::HashSet<PathBuf>>>,
}

impl FakeSidecarClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response this client will return for requests to `socket_path`.
    pub fn set_response(&self, socket_path: impl Into<PathBuf>, response: Value) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(socket_path.into(), response);
    }

    /// Make requests to `socket_path` fail as if the socket did not exist.
    pub fn set_unreachable(&self, socket_path: impl Into<PathBuf>) {
        self.unreachable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(socket_path.into());
    }

    pub fn requests(&self) -> Vec<(PathBuf, Value)> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SidecarClient for FakeSidecarClient {
    async fn request(&self, socket_path: &Path, payload: Value, _timeout: Duration) -> Result<Value, SidecarClientError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((socket_path.to_path_buf(), payload));

        if self
            .unreachable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(socket_path)
        {
            return Err(SidecarClientError::NoSocket(socket_path.display().to_string()));
        }

        let response = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(socket_path)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({"status": "ok"}));

        if response_has_error(&response) {
            let message = response
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(SidecarClientError::SidecarError(message));
        }
        Ok(response)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
