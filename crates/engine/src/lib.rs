// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Lifecycle and health engine: the sidecar supervisor, the client-facing
//! resilient transport, and the composite health monitor.

mod error;
mod recovery;
pub mod health_monitor;
pub mod supervisor;
pub mod transport;

pub use error::EngineError;
pub use health_monitor::{ComponentProbe, DatabasePool, DatabaseProbe, HealthMonitor, HealthMonitorConfig};
pub use recovery::{RestartDecision, RestartPolicy, RestartState};
pub use supervisor::{Adapters, SidecarStatus, SidecarSupervisor, SupervisorConfig};
pub use transport::{RecoveryCallback, ResilientTransport, TransportConfig, TransportState};
