// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tokio::process`-backed spawner.

use super::{LaunchRecipe, ProcessSpawner, SpawnError, SpawnedChild};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Child;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl TokioSpawner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessSpawner for TokioSpawner {
    type Child = TokioChild;

    async fn spawn(&self, recipe: &LaunchRecipe) -> Result<Self::Child, SpawnError> {
        let mut command = tokio::process::Command::new(&recipe.program);
        command
            .args(&recipe.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &recipe.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &recipe.env {
            command.env(key, value);
        }
        let child = command.spawn().map_err(|e| SpawnError::Spawn {
            program: recipe.program.clone(),
            reason: e.to_string(),
        })?;
        Ok(TokioChild { inner: child })
    }
}

pub struct TokioChild {
    inner: Child,
}

#[async_trait]
impl SpawnedChild for TokioChild {
    fn pid(&self) -> u32 {
        self.inner.id().unwrap_or(0)
    }

    async fn wait(&mut self) -> Result<Option<i32>, SpawnError> {
        let status = self.inner.wait().await.map_err(|e| SpawnError::Wait(e.to_string()))?;
        Ok(status.code())
    }

    async fn try_wait(&mut self) -> Result<Option<i32>, SpawnError> {
        match self.inner.try_wait().map_err(|e| SpawnError::Wait(e.to_string()))? {
            Some(status) => Ok(Some(status.code().unwrap_or(0))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "tokio_impl_tests.rs"]
mod tests;
