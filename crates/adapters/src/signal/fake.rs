// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake signaler for testing.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessSignaler, Signal, SignalError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalCall {
    pub pid: u32,
    pub signal: Signal,
}

#[derive(Clone, Default)]
pub struct FakeSignaler {
    calls: Arc<Mutex<Vec<SignalCall>>>,
    dead_pids: Arc<Mutex<HashSet<u32>>>,
}

impl FakeSignaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SignalCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Mark a PID as nonexistent; sending to it will return
    /// `SignalError::NoSuchProcess`.
    pub fn mark_dead(&self, pid: u32) {
        self.dead_pids.lock().unwrap_or_else(|e| e.into_inner()).insert(pid);
    }
}

#[async_trait]
impl ProcessSignaler for FakeSignaler {
    async fn send(&self, pid: u32, signal: Signal) -> Result<(), SignalError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SignalCall { pid, signal });
        if self.dead_pids.lock().unwrap_or_else(|e| e.into_inner()).contains(&pid) {
            return Err(SignalError::NoSuchProcess(pid));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
