// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the OS- and socket-facing edges of the supervisor: process
//! inspection, signal delivery, child-process spawning, the sidecar wire
//! protocol client, and the atomic file lock. Every adapter that talks to
//! the outside world has a real implementation and, under `test-support`,
//! a `Fake*` implementation that records calls for assertions.

pub mod file_lock;
pub mod process_inspector;
pub mod sidecar_client;
pub mod signal;
pub mod spawn;

pub use file_lock::{try_acquire, FileLockError, LockHolder};
pub use process_inspector::{Ownership, ProcessInspector, SysinfoProcessInspector};
pub use sidecar_client::{SidecarClient, SidecarClientError, UnixSidecarClient};
pub use signal::{NixSignaler, ProcessSignaler, Signal, SignalError};
pub use spawn::{LaunchRecipe, ProcessSpawner, SpawnError, SpawnedChild, TokioSpawner};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process_inspector::{FakeProcessInspector, InspectorCall};
#[cfg(any(test, feature = "test-support"))]
pub use sidecar_client::FakeSidecarClient;
#[cfg(any(test, feature = "test-support"))]
pub use signal::{FakeSignaler, SignalCall};
#[cfg(any(test, feature = "test-support"))]
pub use spawn::{FakeChild, FakeSpawner, SpawnCall};
