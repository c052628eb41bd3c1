// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sysinfo`-backed process inspector.

use super::ProcessInspector;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, System};

/// Real process inspector backed by `sysinfo`. Refreshing the whole
/// process table on every call is wasteful but keeps this adapter
/// stateless from the caller's perspective and correct under PID reuse;
/// these probes run on the order of once per health interval, not per
/// request.
#[derive(Clone)]
pub struct SysinfoProcessInspector {
    system: Arc<Mutex<System>>,
}

impl SysinfoProcessInspector {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }

    fn refresh(&self) {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_all();
    }
}

impl Default for SysinfoProcessInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessInspector for SysinfoProcessInspector {
    async fn is_alive(&self, pid: u32) -> bool {
        self.refresh();
        let system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.process(Pid::from_u32(pid)).is_some()
    }

    async fn process_start_age_hours(&self, pid: u32) -> Option<f64> {
        self.refresh();
        let system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        let process = system.process(Pid::from_u32(pid))?;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_secs();
        let age_secs = now.saturating_sub(process.start_time());
        Some(age_secs as f64 / 3600.0)
    }

    async fn command_line(&self, pid: u32) -> Option<String> {
        self.refresh();
        let system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        let process = system.process(Pid::from_u32(pid))?;
        let cmd: Vec<String> = process
            .cmd()
            .iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect();
        if cmd.is_empty() {
            None
        } else {
            Some(cmd.join(" "))
        }
    }

    async fn environment_value(&self, pid: u32, var_name: &str) -> Option<String> {
        self.refresh();
        let system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        let process = system.process(Pid::from_u32(pid))?;
        process.environ().iter().find_map(|entry| {
            let entry = entry.to_string_lossy();
            let (key, value) = entry.split_once('=')?;
            (key == var_name).then(|| value.to_string())
        })
    }

    async fn bound_socket_path(&self, pid: u32, env_var: &str) -> Option<String> {
        self.environment_value(pid, env_var).await
    }
}

#[cfg(test)]
#[path = "sysinfo_impl_tests.rs"]
mod tests;
