// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed registry of live host processes, shared across all
//! host processes on the machine.
//!
//! Each host process appends a `Joined` record on startup and a `Left`
//! record on clean shutdown; [`InstanceRegistry::live_peers`] replays the
//! log and reconciles it against actual process liveness (a host that
//! crashed without writing `Left` still has its stale entry filtered out,
//! since a dead PID is never a peer regardless of what the log says).

use crate::wal::{Wal, WalError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryRecord {
    Joined { pid: u32, project_key: String, started_at_ms: u64 },
    Left { pid: u32, project_key: String },
}

/// A live peer host process, as reconciled from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub pid: u32,
    pub project_key: String,
    pub started_at_ms: u64,
}

pub struct InstanceRegistry {
    path: PathBuf,
}

impl InstanceRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record this process joining the registry.
    pub fn announce_join(&self, pid: u32, project_key: &str, started_at_ms: u64) -> Result<(), WalError> {
        let mut wal: Wal<RegistryRecord> = Wal::open(&self.path)?;
        wal.append(&RegistryRecord::Joined {
            pid,
            project_key: project_key.to_string(),
            started_at_ms,
        })?;
        Ok(())
    }

    /// Record this process leaving the registry on clean shutdown.
    pub fn announce_leave(&self, pid: u32, project_key: &str) -> Result<(), WalError> {
        let mut wal: Wal<RegistryRecord> = Wal::open(&self.path)?;
        wal.append(&RegistryRecord::Left {
            pid,
            project_key: project_key.to_string(),
        })?;
        Ok(())
    }

    /// All instances that have joined and not since left, per the log
    /// alone (no liveness check). Exposed mainly for tests; callers doing
    /// real reload broadcasts should use [`Self::live_peers`].
    pub fn known_instances(&self) -> Result<Vec<Instance>, WalError> {
        let records: Vec<RegistryRecord> = Wal::replay(&self.path)?;
        Ok(reconcile(records))
    }

    /// Instances in `known_instances` whose PID `is_alive` reports true,
    /// excluding `exclude_pid` (normally the caller's own PID) and,
    /// unless `same_project_only` is `false`, restricted to `project_key`.
    pub async fn live_peers<F, Fut>(
        &self,
        project_key: &str,
        same_project_only: bool,
        exclude_pid: u32,
        is_alive: F,
    ) -> Result<Vec<Instance>, WalError>
    where
        F: Fn(u32) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let mut peers = Vec::new();
        for instance in self.known_instances()? {
            if instance.pid == exclude_pid {
                continue;
            }
            if same_project_only && instance.project_key != project_key {
                continue;
            }
            if is_alive(instance.pid).await {
                peers.push(instance);
            }
        }
        Ok(peers)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn reconcile(records: Vec<RegistryRecord>) -> Vec<Instance> {
    let mut instances: Vec<Instance> = Vec::new();
    for record in records {
        match record {
            RegistryRecord::Joined { pid, project_key, started_at_ms } => {
                instances.retain(|i| i.pid != pid);
                instances.push(Instance { pid, project_key, started_at_ms });
            }
            RegistryRecord::Left { pid, .. } => {
                instances.retain(|i| i.pid != pid);
            }
        }
    }
    instances
}

#[cfg(test)]
#[path = "instance_registry_tests.rs"]
mod tests;
