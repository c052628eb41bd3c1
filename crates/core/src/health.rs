// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared health vocabulary.
//!
//! [`HealthState`] and [`ComponentHealth`] are the data types the transport,
//! database, and embedding probes all report through, and that the health
//! monitor aggregates over. Keeping them here (rather than in the engine
//! crate that owns the monitor) lets the adapters crate report health
//! without depending on the engine.

use serde::{Deserialize, Serialize};

/// Health of a single monitored component, ordered worst-to-best is NOT the
/// derive order; use [`HealthState::severity`] when comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Unknown,
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    /// Higher is worse. `Unknown` is excluded from aggregate rollups and
    /// sorts below `Healthy` here only so it never wins a `max` against a
    /// real observation.
    pub fn severity(self) -> u8 {
        match self {
            HealthState::Unknown => 0,
            HealthState::Healthy => 1,
            HealthState::Degraded => 2,
            HealthState::Unhealthy => 3,
        }
    }

    pub fn is_worse_than(self, other: HealthState) -> bool {
        self.severity() > other.severity()
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthState::Unknown => "unknown",
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// A single monitored component's last-known health, as tracked by the
/// health monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub health: HealthState,
    /// Unix millis of the last probe attempt, regardless of outcome.
    pub last_check_at_ms: Option<u64>,
    /// Unix millis of the last probe that succeeded.
    pub last_success_at_ms: Option<u64>,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health: HealthState::Unknown,
            last_check_at_ms: None,
            last_success_at_ms: None,
            error_count: 0,
            last_error: None,
            details: None,
        }
    }

    /// Record a successful probe observation, resetting the error count.
    pub fn record_success(&mut self, now_ms: u64, health: HealthState, details: Option<serde_json::Value>) {
        self.health = health;
        self.last_check_at_ms = Some(now_ms);
        self.last_success_at_ms = Some(now_ms);
        self.error_count = 0;
        self.last_error = None;
        self.details = details;
    }

    /// Record a failed probe observation.
    pub fn record_failure(&mut self, now_ms: u64, health: HealthState, error: impl Into<String>) {
        self.health = health;
        self.last_check_at_ms = Some(now_ms);
        self.error_count = self.error_count.saturating_add(1);
        self.last_error = Some(error.into());
    }
}

/// Aggregate health of the whole system: the worst of all non-`Unknown`
/// components, or `Unknown` if none have reported yet.
pub fn aggregate(components: &[ComponentHealth]) -> HealthState {
    components
        .iter()
        .map(|c| c.health)
        .filter(|h| *h != HealthState::Unknown)
        .max_by_key(|h| h.severity())
        .unwrap_or(HealthState::Unknown)
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
