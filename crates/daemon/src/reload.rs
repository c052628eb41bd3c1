// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ReloadBroadcaster`: signals peer host processes for the same project to
//! hot-reload, coordinating through the shared [`InstanceRegistry`].

use std::sync::Arc;

use oj_host_adapters::{ProcessInspector, ProcessSignaler, Signal};
use oj_host_core::Event;
use oj_host_storage::InstanceRegistry;
use tracing::warn;

/// Why a reload was requested. Carried through for logging and the
/// coordination events only; it has no effect on broadcast mechanics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadReason {
    ToolCatalogChanged,
    ConfigChanged,
    Manual,
}

impl ReloadReason {
    fn as_str(&self) -> &'static str {
        match self {
            Self::ToolCatalogChanged => "tool_catalog_changed",
            Self::ConfigChanged => "config_changed",
            Self::Manual => "manual",
        }
    }
}

/// Broadcast targeting options. Both cross-project and self-inclusive
/// broadcasts require an explicit opt-in; the safe default is "peers of
/// this project only, not myself".
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastOptions {
    pub include_other_projects: bool,
    pub include_self: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub signaled: u32,
    pub failed: u32,
    pub skipped: u32,
}

pub struct ReloadBroadcaster<S: ProcessSignaler, I: ProcessInspector> {
    registry: Arc<InstanceRegistry>,
    signaler: S,
    inspector: I,
    events: Option<tokio::sync::mpsc::Sender<Event>>,
    reload_signal: Signal,
}

impl<S: ProcessSignaler, I: ProcessInspector> ReloadBroadcaster<S, I> {
    pub fn new(registry: Arc<InstanceRegistry>, signaler: S, inspector: I) -> Self {
        Self {
            registry,
            signaler,
            inspector,
            events: None,
            reload_signal: Signal::Usr1,
        }
    }

    pub fn with_events(mut self, tx: tokio::sync::mpsc::Sender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }

    /// Signal every live peer for `project_key`, per `opts`. Peer liveness
    /// is re-verified immediately before signaling (the registry log can be
    /// stale); a peer that is no longer alive counts as skipped, not
    /// failed. Never panics or hard-fails on event-emission errors: those
    /// are best-effort.
    pub async fn broadcast_reload(
        &self,
        project_key: &str,
        self_pid: u32,
        reason: ReloadReason,
        opts: BroadcastOptions,
    ) -> BroadcastOutcome {
        let exclude_pid = if opts.include_self { 0 } else { self_pid };
        let same_project_only = !opts.include_other_projects;

        let inspector = &self.inspector;
        let peers = match self
            .registry
            .live_peers(project_key, same_project_only, exclude_pid, |pid| async move { inspector.is_alive(pid).await })
            .await
        {
            Ok(peers) => peers,
            Err(err) => {
                warn!(error = %err, project_key, "failed to enumerate reload peers");
                return BroadcastOutcome::default();
            }
        };

        let mut outcome = BroadcastOutcome::default();
        for peer in peers {
            if !self.inspector.is_alive(peer.pid).await {
                outcome.skipped += 1;
                continue;
            }

            self.emit(Event::ReloadRequested { project_key: project_key.to_string(), peer_pid: peer.pid });
            self.emit(Event::ReloadDraining { project_key: project_key.to_string(), peer_pid: peer.pid });

            match self.signaler.send(peer.pid, self.reload_signal).await {
                Ok(()) => {
                    outcome.signaled += 1;
                    self.emit(Event::ReloadComplete { project_key: project_key.to_string(), peer_pid: peer.pid });
                }
                Err(err) => {
                    warn!(pid = peer.pid, error = %err, reason = reason.as_str(), "reload signal failed");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
#[path = "reload_tests.rs"]
mod tests;
