// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination events emitted by the supervisor, transport, and monitor.
//!
//! These are the named events a caller can observe over the coordination
//! event bus or in structured logs. They carry enough detail to reconstruct
//! what happened without re-deriving it from log text.

use serde::{Deserialize, Serialize};

/// Which sidecar an event concerns, when the event is sidecar-scoped.
pub use crate::identity::SidecarKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A sidecar finished starting and its socket is accepting connections.
    /// `pid` is `None` when an already-running external process was
    /// adopted rather than spawned (`external` is then `true`).
    Started { kind: SidecarKind, pid: Option<u32>, external: bool },
    /// A sidecar was stopped on request (not a crash).
    Stopped { kind: SidecarKind },
    /// A restart attempt is underway after an unexpected exit.
    Restarting { kind: SidecarKind, attempt: u32 },
    /// A restart attempt failed to bring the sidecar back up.
    RestartFailed { kind: SidecarKind, attempt: u32, reason: String },
    /// The restart backoff loop detector tripped; no further attempts will
    /// be made without external intervention.
    RestartLoop { kind: SidecarKind, attempts: u32 },
    /// The pending-request queue (CoT only) has reached capacity and is
    /// dropping the oldest entry.
    QueueOverflow { kind: SidecarKind, dropped: u32 },
    /// A previously overflowing queue has drained back to empty.
    QueueDrained { kind: SidecarKind },
    /// A transport or monitored component moved into a degraded state.
    Degraded { component: String },
    /// A transport or monitored component recovered to healthy.
    Recovered { component: String },
    /// Graceful shutdown of a transport has begun.
    Disconnecting { component: String },
    /// A transport has finished shutting down.
    Disconnected { component: String },
    /// A peer host process has been asked to reload.
    ReloadRequested { project_key: String, peer_pid: u32 },
    /// A peer host process has acknowledged the reload signal and is
    /// draining in-flight work before restarting its sidecars.
    ReloadDraining { project_key: String, peer_pid: u32 },
    /// A peer host process has finished reloading.
    ReloadComplete { project_key: String, peer_pid: u32 },
    /// A health or recovery probe was attempted; `success` records outcome.
    RecoveryAttempted { component: String, success: bool },
}

impl Event {
    /// Stable, log-friendly name for the event variant.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Started { .. } => "started",
            Event::Stopped { .. } => "stopped",
            Event::Restarting { .. } => "restarting",
            Event::RestartFailed { .. } => "restart_failed",
            Event::RestartLoop { .. } => "restart_loop",
            Event::QueueOverflow { .. } => "queue_overflow",
            Event::QueueDrained { .. } => "queue_drained",
            Event::Degraded { .. } => "degraded",
            Event::Recovered { .. } => "recovered",
            Event::Disconnecting { .. } => "disconnecting",
            Event::Disconnected { .. } => "disconnected",
            Event::ReloadRequested { .. } => "reload_requested",
            Event::ReloadDraining { .. } => "reload_draining",
            Event::ReloadComplete { .. } => "reload_complete",
            Event::RecoveryAttempted { .. } => "recovery_attempted",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
