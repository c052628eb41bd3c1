// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown for one project: acquires the project's
//! start lock, joins the machine-wide instance registry, brings up the
//! project's sidecar supervisors and health monitor, and tears everything
//! down cleanly on exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use oj_host_adapters::{FileLockError, NixSignaler, SysinfoProcessInspector};
use oj_host_core::{Clock, Event, ProjectIdentity, SystemClock};
use oj_host_storage::InstanceRegistry;
use tracing::{info, warn};

use crate::registry::Teardown;

use crate::error::DaemonError;
use crate::project::ProjectHost;
use crate::reload::ReloadBroadcaster;

/// Resolved configuration for one daemon run, derived from a project path.
#[derive(Debug, Clone)]
pub struct Config {
    pub identity: ProjectIdentity,
    pub instance_registry_path: PathBuf,
}

impl Config {
    pub fn for_project(project_root: impl AsRef<Path>) -> Result<Self, DaemonError> {
        let identity = ProjectIdentity::new(project_root.as_ref())?;
        Ok(Self {
            identity,
            instance_registry_path: instance_registry_path(),
        })
    }

    /// Per-project daemon log file, alongside the sidecar bookkeeping files.
    pub fn log_path(&self) -> PathBuf {
        self.identity.socket_dir().join("daemon.log")
    }
}

/// `XDG_STATE_HOME`-rooted path for the machine-wide instance registry,
/// shared by every project's host process, overridable for tests and
/// non-XDG platforms.
fn instance_registry_path() -> PathBuf {
    if let Ok(custom) = std::env::var("OJ_HOST_INSTANCE_REGISTRY") {
        return PathBuf::from(custom);
    }
    let base = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".local/state"));
    base.join("oj-host").join("instances.jsonl")
}

/// The running daemon's composed state for one project.
pub struct DaemonState {
    pub config: Config,
    pub host: Arc<ProjectHost<SystemClock>>,
    pub instance_registry: Arc<InstanceRegistry>,
    pub reload: ReloadBroadcaster<NixSignaler, SysinfoProcessInspector>,
    pub events: tokio::sync::mpsc::Receiver<Event>,
    pid: u32,
    started: bool,
}

impl DaemonState {
    /// Bring up one project's daemon: acquire the project's start lock
    /// (reusing the same atomic-file-lock primitive the sidecar supervisors
    /// use), join the instance registry, then start the sidecars and
    /// health monitor. The start lock is released once this process's PID
    /// file is in place, since liveness from here on is tracked by the PID
    /// file and the instance registry, not by holding the lock open.
    pub async fn startup(config: Config) -> Result<Self, DaemonError> {
        config.identity.ensure_socket_dir()?;

        let lock_path = config.identity.root().join(".oj-host-daemon.lock");
        let pid = std::process::id();
        let now = SystemClock.now_ms();
        match oj_host_adapters::file_lock::try_acquire(&lock_path, std::time::Duration::from_secs(30), now, pid) {
            Ok(()) => {}
            Err(FileLockError::Held(lock_path)) => {
                warn!(?lock_path, "daemon already running for this project");
                return Err(DaemonError::AlreadyRunning);
            }
            Err(FileLockError::Io(path, source)) => {
                return Err(DaemonError::Io(std::io::Error::new(source.kind(), format!("{path:?}: {source}"))))
            }
        }

        let (tx, rx) = tokio::sync::mpsc::channel(256);
        let host = ProjectHost::new(config.identity.clone(), SystemClock, tx, None).await;
        host.start().await;

        if let Some(parent) = config.instance_registry_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let instance_registry = Arc::new(InstanceRegistry::new(&config.instance_registry_path));
        instance_registry.announce_join(pid, config.identity.project_key(), now)?;

        let reload = ReloadBroadcaster::new(Arc::clone(&instance_registry), NixSignaler::new(), SysinfoProcessInspector::new());

        let _ = oj_host_adapters::file_lock::release(&lock_path);

        info!(project_key = config.identity.project_key(), pid, "daemon started");

        Ok(Self {
            config,
            host,
            instance_registry,
            reload,
            events: rx,
            pid,
            started: true,
        })
    }

    /// Handle the local reload signal (`SIGUSR1`/`SIGHUP`): reinitialise
    /// this project's sidecars and health monitor in place.
    pub async fn handle_reload_signal(&self) {
        info!("reload signal received, reinitialising sidecars");
        self.host.reload().await;
    }

    /// Ask peer host processes for this project to reload.
    pub async fn broadcast_reload(&self, reason: crate::reload::ReloadReason) -> crate::reload::BroadcastOutcome {
        self.reload
            .broadcast_reload(
                self.config.identity.project_key(),
                self.pid,
                reason,
                crate::reload::BroadcastOptions::default(),
            )
            .await
    }

    /// Drain an internal coordination event and log it. Called from the
    /// daemon's main select loop.
    pub fn log_event(&self, event: &Event) {
        info!(event = event.name(), "coordination event");
    }

    pub async fn shutdown(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        let _ = self.instance_registry.announce_leave(self.pid, self.config.identity.project_key());
        Arc::clone(&self.host).shutdown().await;
        info!(project_key = self.config.identity.project_key(), "daemon stopped");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
