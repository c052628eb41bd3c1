// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning sidecar child processes.

mod tokio_impl;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChild, FakeSpawner, SpawnCall};

pub use tokio_impl::TokioSpawner;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// What to launch and how.
#[derive(Debug, Clone)]
pub struct LaunchRecipe {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// A handle to a spawned child: its PID and a way to wait for exit.
#[async_trait]
pub trait SpawnedChild: Send + Sync {
    fn pid(&self) -> u32;
    /// Wait for the child to exit, returning its exit code if the OS
    /// reports one.
    async fn wait(&mut self) -> Result<Option<i32>, SpawnError>;
    /// Returns `true` once the child has exited, without blocking.
    async fn try_wait(&mut self) -> Result<Option<i32>, SpawnError>;
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("failed to wait on child: {0}")]
    Wait(String),
}

#[async_trait]
pub trait ProcessSpawner: Clone + Send + Sync + 'static {
    type Child: SpawnedChild;

    /// Spawn a sidecar: stdin is ignored (the sidecar talks over its
    /// socket, not stdio), stdout and stderr are captured for log
    /// forwarding and stderr keyword scanning.
    async fn spawn(&self, recipe: &LaunchRecipe) -> Result<Self::Child, SpawnError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
