// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake spawner for testing.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LaunchRecipe, ProcessSpawner, SpawnError, SpawnedChild};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct SpawnCall {
    pub recipe: LaunchRecipe,
}

#[derive(Clone, Default)]
pub struct FakeSpawner {
    calls: Arc<Mutex<Vec<SpawnCall>>>,
    next_pid: Arc<AtomicU32>,
    fail_next: Arc<Mutex<Option<String>>>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self {
            next_pid: Arc::new(AtomicU32::new(1000)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SpawnCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make the next `spawn` call fail with the given message.
    pub fn fail_next_spawn(&self, message: impl Into<String>) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }
}

#[async_trait]
impl ProcessSpawner for FakeSpawner {
    type Child = FakeChild;

    async fn spawn(&self, recipe: &LaunchRecipe) -> Result<Self::Child, SpawnError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SpawnCall { recipe: recipe.clone() });
        if let Some(message) = self.fail_next.lock().unwrap_or_else(|e| e.into_inner()).take() {
            return Err(SpawnError::Spawn {
                program: recipe.program.clone(),
                reason: message,
            });
        }
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        Ok(FakeChild {
            pid,
            exited: Arc::new(Mutex::new(None)),
            notify: Arc::new(Notify::new()),
        })
    }
}

#[derive(Clone)]
pub struct FakeChild {
    pid: u32,
    exited: Arc<Mutex<Option<i32>>>,
    notify: Arc<Notify>,
}

impl FakeChild {
    /// Simulate the child exiting, from a handle kept by the test. Wakes
    /// any `wait()` call currently blocked on this child.
    pub fn mark_exited(&self, code: i32) {
        *self.exited.lock().unwrap_or_else(|e| e.into_inner()) = Some(code);
        self.notify.notify_waiters();
    }
}

#[async_trait]
impl SpawnedChild for FakeChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    /// Blocks until `mark_exited` is called on any clone of this handle,
    /// the way a real child's `wait()` blocks until process exit.
    async fn wait(&mut self) -> Result<Option<i32>, SpawnError> {
        loop {
            if let Some(code) = *self.exited.lock().unwrap_or_else(|e| e.into_inner()) {
                return Ok(Some(code));
            }
            self.notify.notified().await;
        }
    }

    async fn try_wait(&mut self) -> Result<Option<i32>, SpawnError> {
        Ok(*self.exited.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
