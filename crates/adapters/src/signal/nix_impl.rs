// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nix`-backed signal delivery.

use super::{ProcessSignaler, Signal, SignalError};
use async_trait::async_trait;
use nix::sys::signal::{self, Signal as NixSignal};
use nix::unistd::Pid;

#[derive(Debug, Clone, Copy, Default)]
pub struct NixSignaler;

impl NixSignaler {
    pub fn new() -> Self {
        Self
    }
}

fn to_nix_signal(signal: Signal) -> NixSignal {
    match signal {
        Signal::Term => NixSignal::SIGTERM,
        Signal::Kill => NixSignal::SIGKILL,
        Signal::Usr1 => NixSignal::SIGUSR1,
        Signal::Hup => NixSignal::SIGHUP,
    }
}

#[async_trait]
impl ProcessSignaler for NixSignaler {
    async fn send(&self, pid: u32, signal: Signal) -> Result<(), SignalError> {
        let nix_pid = Pid::from_raw(pid as i32);
        let nix_signal = to_nix_signal(signal);
        signal::kill(nix_pid, nix_signal).map_err(|errno| match errno {
            nix::errno::Errno::ESRCH => SignalError::NoSuchProcess(pid),
            nix::errno::Errno::EPERM => SignalError::PermissionDenied(pid),
            other => SignalError::Other(pid, other.to_string()),
        })
    }
}

#[cfg(test)]
#[path = "nix_impl_tests.rs"]
mod tests;
