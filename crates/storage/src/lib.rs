// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Filesystem-backed durable state: the append-only WAL primitive, the
//! cross-process instance registry built on it, and the observability
//! trail writers.

pub mod instance_registry;
pub mod trail;
pub mod wal;

pub use instance_registry::{Instance, InstanceRegistry, RegistryRecord};
pub use trail::{TrailError, TrailWriter};
pub use wal::{Wal, WalError};
