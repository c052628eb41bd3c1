// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sending Unix signals to other processes.

mod nix_impl;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSignaler, SignalCall};

pub use nix_impl::NixSignaler;

use async_trait::async_trait;
use thiserror::Error;

/// The signals this system ever sends to another process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Term,
    Kill,
    /// Canonical reload signal (spec.md open question: SIGUSR1 is
    /// canonical, SIGHUP is an accepted alias for local dev).
    Usr1,
    Hup,
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("process {0} does not exist")]
    NoSuchProcess(u32),
    #[error("not permitted to signal process {0}")]
    PermissionDenied(u32),
    #[error("failed to signal process {0}: {1}")]
    Other(u32, String),
}

#[async_trait]
pub trait ProcessSignaler: Clone + Send + Sync + 'static {
    async fn send(&self, pid: u32, signal: Signal) -> Result<(), SignalError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
