// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared across the engine.

use oj_host_adapters::{FileLockError, SidecarClientError, SignalError, SpawnError};
use oj_host_core::error::{Classified, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("spawn failed: {0}")]
    Spawn(#[from] SpawnError),
    #[error("lock error: {0}")]
    Lock(#[from] FileLockError),
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
    #[error("sidecar client error: {0}")]
    SidecarClient(#[from] SidecarClientError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Classified for EngineError {
    fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Spawn(_) => ErrorKind::Lifecycle,
            EngineError::Lock(FileLockError::Held(_)) => ErrorKind::Contention,
            EngineError::Lock(FileLockError::Io(..)) => ErrorKind::TransientIo,
            EngineError::Signal(SignalError::NoSuchProcess(_)) => ErrorKind::Lifecycle,
            EngineError::Signal(_) => ErrorKind::TransientIo,
            EngineError::SidecarClient(SidecarClientError::SidecarError(_)) => ErrorKind::SidecarReported,
            EngineError::SidecarClient(_) => ErrorKind::TransientIo,
            EngineError::Io(_) => ErrorKind::TransientIo,
        }
    }
}
