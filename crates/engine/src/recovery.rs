// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart policy and loop detection for [`crate::supervisor::SidecarSupervisor`].
//!
//! A pure decision function over a small state struct, so the backoff and
//! loop-detection rules can be exercised without an actual child process.

use std::time::Duration;

use oj_host_core::config;

/// Tunables for restart backoff and loop detection.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    pub cooldown: Duration,
    pub max_attempts: u32,
    /// Restart count within the last 60s at or above which a restart loop
    /// is declared.
    pub loop_threshold: u32,
}

impl RestartPolicy {
    pub fn from_env(prefix: &str, default_max_attempts: usize) -> Self {
        Self {
            cooldown: config::duration_secs_env(prefix, "RESTART_COOLDOWN", Duration::from_secs(10)),
            max_attempts: config::usize_env(prefix, "MAX_RESTARTS", default_max_attempts) as u32,
            loop_threshold: 3,
        }
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(10),
            max_attempts: 5,
            loop_threshold: 3,
        }
    }
}

/// Tracks restart attempts for one sidecar. Timestamps are unix-ms so the
/// 60-second loop window and cooldown gate can be evaluated against an
/// injected [`oj_host_core::Clock`] rather than wall-clock time directly.
#[derive(Debug, Clone, Default)]
pub struct RestartState {
    pub restart_count: u32,
    /// Most recent restart timestamps, capped at 10 entries, oldest first.
    pub recent_restarts_ms: Vec<u64>,
    pub last_restart_ms: Option<u64>,
}

impl RestartState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count restarts recorded within the last 60s of `now_ms`.
    pub fn restarts_in_last_60s(&self, now_ms: u64) -> u32 {
        self.recent_restarts_ms
            .iter()
            .filter(|&&ts| now_ms.saturating_sub(ts) < 60_000)
            .count() as u32
    }

    pub fn record_restart(&mut self, now_ms: u64) {
        self.restart_count += 1;
        self.last_restart_ms = Some(now_ms);
        self.recent_restarts_ms.push(now_ms);
        if self.recent_restarts_ms.len() > 10 {
            self.recent_restarts_ms.remove(0);
        }
    }

    /// Exponential backoff for a restart loop: `min(2^restartCount * 1s, 5min)`.
    pub fn loop_backoff(&self) -> Duration {
        let secs = 2u64.saturating_pow(self.restart_count.min(32)).min(300);
        Duration::from_secs(secs)
    }
}

/// What the supervisor should do next on an unexpected child exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartDecision {
    /// Too many restarts in the last 60s; wait `backoff` then restart.
    LoopBackoff { backoff: Duration },
    /// Still within the cooldown window since the last restart; wait.
    Cooldown { remaining: Duration },
    /// Attempts exhausted; give up until a user-initiated start.
    GiveUp,
    /// Attempt a restart now.
    Restart { attempt: u32 },
}

/// Decide what to do about an unexpected exit, given the current state and
/// policy. Pure: does not mutate `state` or sleep.
pub fn decide(state: &RestartState, policy: &RestartPolicy, now_ms: u64) -> RestartDecision {
    if state.restart_count >= policy.max_attempts {
        return RestartDecision::GiveUp;
    }
    if state.restarts_in_last_60s(now_ms) >= policy.loop_threshold {
        return RestartDecision::LoopBackoff { backoff: state.loop_backoff() };
    }
    if let Some(last) = state.last_restart_ms {
        let elapsed = Duration::from_millis(now_ms.saturating_sub(last));
        if elapsed < policy.cooldown {
            return RestartDecision::Cooldown { remaining: policy.cooldown - elapsed };
        }
    }
    RestartDecision::Restart { attempt: state.restart_count + 1 }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
