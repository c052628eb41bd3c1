// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process inspector for testing.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::ProcessInspector;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded inspector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectorCall {
    IsAlive { pid: u32 },
    ProcessStartAge { pid: u32 },
    CommandLine { pid: u32 },
    EnvironmentValue { pid: u32, var_name: String },
    BoundSocketPath { pid: u32, env_var: String },
}

#[derive(Debug, Clone, Default)]
struct FakeProcess {
    alive: bool,
    age_hours: Option<f64>,
    command_line: Option<String>,
    env: HashMap<String, String>,
}

/// Fake process inspector with per-PID fixtures and call recording.
#[derive(Clone, Default)]
pub struct FakeProcessInspector {
    processes: Arc<Mutex<HashMap<u32, FakeProcess>>>,
    calls: Arc<Mutex<Vec<InspectorCall>>>,
}

impl FakeProcessInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<InspectorCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_alive(&self, pid: u32, alive: bool) {
        let mut processes = self.processes.lock().unwrap_or_else(|e| e.into_inner());
        processes.entry(pid).or_default().alive = alive;
    }

    pub fn set_age_hours(&self, pid: u32, hours: f64) {
        let mut processes = self.processes.lock().unwrap_or_else(|e| e.into_inner());
        processes.entry(pid).or_default().age_hours = Some(hours);
    }

    pub fn set_command_line(&self, pid: u32, cmdline: impl Into<String>) {
        let mut processes = self.processes.lock().unwrap_or_else(|e| e.into_inner());
        processes.entry(pid).or_default().command_line = Some(cmdline.into());
    }

    pub fn set_env(&self, pid: u32, var_name: impl Into<String>, value: impl Into<String>) {
        let mut processes = self.processes.lock().unwrap_or_else(|e| e.into_inner());
        processes
            .entry(pid)
            .or_default()
            .env
            .insert(var_name.into(), value.into());
    }

    fn record(&self, call: InspectorCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

#[async_trait]
impl ProcessInspector for FakeProcessInspector {
    async fn is_alive(&self, pid: u32) -> bool {
        self.record(InspectorCall::IsAlive { pid });
        self.processes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&pid)
            .map(|p| p.alive)
            .unwrap_or(false)
    }

    async fn process_start_age_hours(&self, pid: u32) -> Option<f64> {
        self.record(InspectorCall::ProcessStartAge { pid });
        self.processes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&pid)
            .and_then(|p| p.age_hours)
    }

    async fn command_line(&self, pid: u32) -> Option<String> {
        self.record(InspectorCall::CommandLine { pid });
        self.processes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&pid)
            .and_then(|p| p.command_line.clone())
    }

    async fn environment_value(&self, pid: u32, var_name: &str) -> Option<String> {
        self.record(InspectorCall::EnvironmentValue {
            pid,
            var_name: var_name.to_string(),
        });
        self.processes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&pid)
            .and_then(|p| p.env.get(var_name).cloned())
    }

    async fn bound_socket_path(&self, pid: u32, env_var: &str) -> Option<String> {
        self.record(InspectorCall::BoundSocketPath {
            pid,
            env_var: env_var.to_string(),
        });
        self.environment_value(pid, env_var).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
