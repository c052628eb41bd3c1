// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only OS process inspection.
//!
//! Every probe here is best-effort: an OS or platform that cannot answer a
//! question returns `None` rather than an error, since "unknown" and
//! "absent" are handled identically by every caller (the supervisor never
//! treats an inspector's ignorance as a reason to act).

mod sysinfo_impl;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessInspector, InspectorCall};

pub use sysinfo_impl::SysinfoProcessInspector;

use async_trait::async_trait;

/// What the supervisor could determine about a PID's ownership of this
/// project's sidecar, used by the hard safety rule in
/// [`ProcessInspector::bound_socket_path`]'s caller: never kill unless this
/// comes back affirmative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The bound-socket env var (or, failing that, the command line)
    /// matches this project's socket path.
    OwnedByThisProject,
    /// The process is alive and identifiable, but bound to a different
    /// project's socket.
    OwnedByOtherProject,
    /// Ownership could not be established either way.
    Unknown,
}

#[async_trait]
pub trait ProcessInspector: Clone + Send + Sync + 'static {
    /// Zero-signal liveness probe.
    async fn is_alive(&self, pid: u32) -> bool;

    /// Age of the process since it started, in hours. `None` if the PID is
    /// dead or the OS can't report start time.
    async fn process_start_age_hours(&self, pid: u32) -> Option<f64>;

    /// Full argv joined into a single string.
    async fn command_line(&self, pid: u32) -> Option<String>;

    /// Value of a single environment variable from the target process's
    /// environment. `None` if unset, the process is dead, or this
    /// platform cannot read a foreign process's environment.
    async fn environment_value(&self, pid: u32, var_name: &str) -> Option<String>;

    /// Value of the well-known env var naming the socket this process was
    /// launched for.
    async fn bound_socket_path(&self, pid: u32, env_var: &str) -> Option<String>;

    /// Apply the hard safety rule: a process is this project's iff its
    /// bound-socket env matches `expected_socket`, or — when that can't be
    /// read — its command line contains `expected_socket`.
    async fn classify_ownership(&self, pid: u32, env_var: &str, expected_socket: &str) -> Ownership {
        if !self.is_alive(pid).await {
            return Ownership::Unknown;
        }
        if let Some(bound) = self.bound_socket_path(pid, env_var).await {
            return if bound == expected_socket {
                Ownership::OwnedByThisProject
            } else {
                Ownership::OwnedByOtherProject
            };
        }
        match self.command_line(pid).await {
            Some(cmdline) if cmdline.contains(expected_socket) => Ownership::OwnedByThisProject,
            Some(_) => Ownership::Unknown,
            None => Ownership::Unknown,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
