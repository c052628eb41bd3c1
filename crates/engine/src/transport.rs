// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ResilientTransport`: tracks activity on the client-facing stdio
//! transport and drives degrade/recover/disconnect transitions.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use oj_host_core::{config, Clock, Event};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub type RecoveryCallback = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Initializing,
    Connected,
    Degraded,
    Recovering,
    Disconnecting,
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub inactivity_threshold: Duration,
    pub check_interval: Duration,
    pub keepalive_interval: Duration,
    pub keepalive_enabled: bool,
    pub startup_grace: Duration,
    pub shutdown_grace: Duration,
    pub recovery_enabled: bool,
    pub recovery_max_attempts: u32,
    pub recovery_base_delay: Duration,
    pub recovery_max_delay: Duration,
    pub recovery_multiplier: u32,
    pub max_errors: u32,
}

impl TransportConfig {
    pub fn from_env(prefix: &str) -> Self {
        Self {
            inactivity_threshold: config::duration_secs_env(prefix, "INACTIVITY_THRESHOLD", Duration::from_secs(5 * 60)),
            check_interval: config::duration_secs_env(prefix, "CHECK_INTERVAL", Duration::from_secs(30)),
            keepalive_interval: config::duration_secs_env(prefix, "KEEPALIVE_INTERVAL", Duration::from_secs(60)),
            keepalive_enabled: config::bool_env(prefix, "KEEPALIVE_ENABLED", true),
            startup_grace: config::duration_secs_env(prefix, "STDIN_GRACE", Duration::from_secs(5)),
            shutdown_grace: config::duration_ms_env(prefix, "SHUTDOWN_GRACE", Duration::from_millis(100)),
            recovery_enabled: config::bool_env(prefix, "RECOVERY_ENABLED", true),
            recovery_max_attempts: config::usize_env(prefix, "RECOVERY_ATTEMPTS", 5) as u32,
            recovery_base_delay: config::duration_secs_env(prefix, "RECOVERY_BASE", Duration::from_secs(1)),
            recovery_max_delay: config::duration_secs_env(prefix, "RECOVERY_MAX", Duration::from_secs(30)),
            recovery_multiplier: config::usize_env(prefix, "RECOVERY_MULTIPLIER", 2) as u32,
            max_errors: config::usize_env(prefix, "MAX_ERRORS", 10) as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportErrorEntry {
    pub kind: String,
    pub message: String,
    pub at_ms: u64,
    pub suggestion: String,
}

struct Inner {
    state: TransportState,
    last_activity_ms: u64,
    started_at_ms: u64,
    recovery_attempt: u32,
    error_count: u32,
    recent_errors: VecDeque<TransportErrorEntry>,
}

/// Observes a client-facing stdio transport and drives its health state
/// machine. The host owns the actual stream; this type only tracks
/// activity and timing and invokes host-supplied callbacks at transitions.
pub struct ResilientTransport<C: Clock> {
    name: String,
    config: TransportConfig,
    clock: C,
    events: Option<tokio::sync::mpsc::Sender<Event>>,
    keepalive: Option<RecoveryCallback>,
    recovery: Option<RecoveryCallback>,
    inner: Mutex<Inner>,
}

impl<C: Clock + 'static> ResilientTransport<C> {
    pub fn new(name: impl Into<String>, config: TransportConfig, clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            name: name.into(),
            config,
            clock,
            events: None,
            keepalive: None,
            recovery: None,
            inner: Mutex::new(Inner {
                state: TransportState::Initializing,
                last_activity_ms: now,
                started_at_ms: now,
                recovery_attempt: 0,
                error_count: 0,
                recent_errors: VecDeque::new(),
            }),
        }
    }

    pub fn with_events(mut self, tx: tokio::sync::mpsc::Sender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_keepalive(mut self, cb: RecoveryCallback) -> Self {
        self.keepalive = Some(cb);
        self
    }

    pub fn with_recovery(mut self, cb: RecoveryCallback) -> Self {
        self.recovery = Some(cb);
        self
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }

    pub async fn state(&self) -> TransportState {
        self.inner.lock().await.state
    }

    /// Mark Connected on first activity, or record an inbound-byte tick.
    pub async fn record_activity(self: &Arc<Self>) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().await;
        inner.last_activity_ms = now;
        let was_degraded = matches!(inner.state, TransportState::Degraded | TransportState::Recovering);
        if matches!(inner.state, TransportState::Initializing) {
            inner.state = TransportState::Connected;
        } else if was_degraded {
            inner.state = TransportState::Connected;
            inner.recovery_attempt = 0;
        }
        drop(inner);
        if was_degraded {
            self.emit(Event::Recovered { component: self.name.clone() });
            if let Some(cb) = self.recovery.clone() {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(e) = cb().await {
                        this.record_error("recovery_callback", &e).await;
                    }
                });
            }
        }
    }

    pub async fn record_error(&self, kind: &str, message: &str) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().await;
        inner.error_count += 1;
        inner.recent_errors.push_back(TransportErrorEntry {
            kind: kind.to_string(),
            message: message.to_string(),
            at_ms: now,
            suggestion: suggestion_for(kind),
        });
        if inner.recent_errors.len() > 10 {
            inner.recent_errors.pop_front();
        }
        let over_threshold = inner.error_count >= self.config.max_errors;
        drop(inner);
        warn!(kind, message, "transport error recorded");
        if over_threshold {
            self.connection_lost("error_threshold_exceeded").await;
        }
    }

    /// Periodic 30s non-overlapping inactivity check. Callers should invoke
    /// this from a single scheduling loop; it is not self-scheduling.
    pub async fn check_inactivity(&self) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().await;

        if now.saturating_sub(inner.started_at_ms) < self.config.startup_grace.as_millis() as u64 {
            return;
        }
        if inner.state != TransportState::Connected {
            return;
        }
        if now.saturating_sub(inner.last_activity_ms) > self.config.inactivity_threshold.as_millis() as u64 {
            inner.state = TransportState::Degraded;
            drop(inner);
            self.emit(Event::Degraded { component: self.name.clone() });
            if self.config.recovery_enabled {
                self.run_recovery().await;
            }
        }
    }

    async fn run_recovery(&self) {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != TransportState::Degraded {
                return;
            }
            inner.state = TransportState::Recovering;
        }

        loop {
            let attempt = {
                let mut inner = self.inner.lock().await;
                inner.recovery_attempt += 1;
                inner.recovery_attempt
            };
            if attempt > self.config.recovery_max_attempts {
                self.connection_lost("recovery_attempts_exhausted").await;
                return;
            }

            let delay = backoff_with_jitter(&self.config, attempt);
            tokio::time::sleep(delay).await;

            if let Some(cb) = self.recovery.clone() {
                if cb().await.is_ok() {
                    let mut inner = self.inner.lock().await;
                    inner.state = TransportState::Connected;
                    inner.recovery_attempt = 0;
                    drop(inner);
                    self.emit(Event::Recovered { component: self.name.clone() });
                    return;
                }
            } else {
                let mut inner = self.inner.lock().await;
                inner.state = TransportState::Connected;
                inner.recovery_attempt = 0;
                drop(inner);
                self.emit(Event::Recovered { component: self.name.clone() });
                return;
            }
        }
    }

    async fn connection_lost(&self, reason: &str) {
        {
            let mut inner = self.inner.lock().await;
            inner.state = TransportState::Disconnecting;
        }
        self.emit(Event::Disconnecting { component: self.name.clone() });
        debug!(reason, "transport connection lost");
        tokio::time::sleep(self.config.shutdown_grace).await;
        let mut inner = self.inner.lock().await;
        inner.state = TransportState::Disconnected;
        drop(inner);
        self.emit(Event::Disconnected { component: self.name.clone() });
    }

    /// 60s keepalive tick: host-specific idle work via the keepalive callback.
    pub async fn keepalive_tick(self: &Arc<Self>) {
        if !self.config.keepalive_enabled {
            return;
        }
        let Some(cb) = self.keepalive.clone() else { return };
        if let Err(e) = cb().await {
            self.record_error("keepalive", &e).await;
        } else {
            self.record_activity().await;
        }
    }

    pub async fn error_count(&self) -> u32 {
        self.inner.lock().await.error_count
    }

    pub async fn recent_errors(&self) -> Vec<TransportErrorEntry> {
        self.inner.lock().await.recent_errors.iter().cloned().collect()
    }

    pub async fn shutdown(&self) {
        self.connection_lost("shutdown").await;
    }
}

fn backoff_with_jitter(config: &TransportConfig, attempt: u32) -> Duration {
    let base_ms = config.recovery_base_delay.as_millis() as u64;
    let max_ms = config.recovery_max_delay.as_millis() as u64;
    let multiplier = config.recovery_multiplier.max(1) as u64;
    let raw = base_ms.saturating_mul(multiplier.saturating_pow(attempt.saturating_sub(1)));
    let capped = raw.min(max_ms);
    let jitter_range = (capped / 10).max(1);
    let jitter = rand::thread_rng().gen_range(0..=jitter_range * 2) as i64 - jitter_range as i64;
    Duration::from_millis((capped as i64 + jitter).max(0) as u64)
}

fn suggestion_for(kind: &str) -> String {
    match kind {
        "keepalive" => "check whether the client process is still attached to stdio".to_string(),
        "recovery_callback" => "verify the host can re-announce its capabilities to the client".to_string(),
        _ => "inspect recent transport errors for a pattern".to_string(),
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
