// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real Unix-domain-socket sidecar client.

use super::{response_has_error, SidecarClient, SidecarClientError};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnixSidecarClient;

impl UnixSidecarClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SidecarClient for UnixSidecarClient {
    async fn request(&self, socket_path: &Path, payload: Value, timeout: Duration) -> Result<Value, SidecarClientError> {
        if !socket_path.exists() {
            return Err(SidecarClientError::NoSocket(socket_path.display().to_string()));
        }
        tokio::time::timeout(timeout, self.request_inner(socket_path, payload))
            .await
            .map_err(|_| SidecarClientError::Timeout(timeout))?
    }
}

impl UnixSidecarClient {
    async fn request_inner(&self, socket_path: &Path, payload: Value) -> Result<Value, SidecarClientError> {
        let mut stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| SidecarClientError::Connect(e.to_string()))?;

        let mut line = serde_json::to_string(&payload)
            .map_err(|e| SidecarClientError::Write(e.to_string()))?;
        line.push('\n');
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SidecarClientError::Write(e.to_string()))?;
        stream.flush().await.map_err(|e| SidecarClientError::Write(e.to_string()))?;

        let mut reader = BufReader::new(stream);
        let mut response_line = String::new();
        reader
            .read_line(&mut response_line)
            .await
            .map_err(|e| SidecarClientError::Read(e.to_string()))?;

        let response: Value = serde_json::from_str(response_line.trim_end())
            .map_err(|e| SidecarClientError::InvalidJson(e.to_string()))?;

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
#[path = "unix_impl_tests.rs"]
mod tests;
