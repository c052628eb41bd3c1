// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use oj_host_core::IdentityError;
use oj_host_storage::WalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("project root does not exist or is unreadable: {0}")]
    ProjectNotFound(std::path::PathBuf),
    #[error("project identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("daemon is already running for this project (pid file held)")]
    AlreadyRunning,
    #[error("failed to bind control socket: {0}")]
    BindFailed(std::io::Error),
    #[error("instance registry error: {0}")]
    Registry(#[from] WalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
