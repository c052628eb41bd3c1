// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `HealthMonitor`: composes transport/database/embedding probes with
//! adaptive, reentrancy-guarded recursive scheduling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oj_host_core::{aggregate_health, config, ComponentHealth, Event, HealthState};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One probed component. Implementations never panic; a probe failure is
/// reported as an `Err`, not a crash.
#[async_trait]
pub trait ComponentProbe: Send + Sync {
    fn name(&self) -> &str;
    async fn probe(&self) -> HealthState;
    /// Advisory recovery action. The embedding probe's recovery is
    /// advisory-only — the sidecar supervisor owns the actual restart.
    async fn recover(&self) -> bool {
        false
    }
}

/// A connection pool handle this crate probes but does not own the schema
/// or query surface of. `trivial_query` should run whatever the caller
/// considers a cheap liveness query (e.g. `SELECT 1`); `waiter_count` and
/// `pool_size` back the §4.6 degraded-on-contention rule.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a trivial query; `true` on success. Must not block indefinitely —
    /// `DatabaseProbe` still wraps the call in its own timeout, but a pool
    /// that hangs past that timeout is reported `Unhealthy`, not cancelled.
    async fn trivial_query(&self) -> bool;
    /// Connections currently waiting for a pool slot.
    fn waiter_count(&self) -> usize;
    /// Configured pool size (max connections).
    fn pool_size(&self) -> usize;
}

/// §4.6 database probe: a trivial query under timeout, degraded when the
/// pool is under enough contention that more than half its capacity is
/// queued waiting for a connection.
pub struct DatabaseProbe {
    name: String,
    pool: Arc<dyn DatabasePool>,
    timeout: Duration,
}

impl DatabaseProbe {
    pub fn new(pool: Arc<dyn DatabasePool>) -> Self {
        Self { name: "database".to_string(), pool, timeout: Duration::from_secs(5) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ComponentProbe for DatabaseProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> HealthState {
        let ok = tokio::time::timeout(self.timeout, self.pool.trivial_query()).await.unwrap_or(false);
        if !ok {
            return HealthState::Unhealthy;
        }
        let pool_size = self.pool.pool_size();
        if pool_size > 0 && self.pool.waiter_count() * 2 > pool_size {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        }
    }

    async fn recover(&self) -> bool {
        tokio::time::timeout(self.timeout, self.pool.trivial_query()).await.unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct HealthMonitorConfig {
    pub healthy_interval: Duration,
    pub unhealthy_interval: Duration,
    pub recovery_threshold: u32,
    pub recovery_interval: Duration,
    pub auto_recovery: bool,
}

impl HealthMonitorConfig {
    pub fn from_env(prefix: &str) -> Self {
        Self {
            healthy_interval: config::duration_ms_env(prefix, "HEALTH_CHECK_INTERVAL_MS", Duration::from_secs(30)),
            unhealthy_interval: config::duration_ms_env(prefix, "UNHEALTHY_INTERVAL_MS", Duration::from_secs(5)),
            recovery_threshold: config::usize_env(prefix, "RECOVERY_THRESHOLD", 2) as u32,
            recovery_interval: config::duration_secs_env(prefix, "RECOVERY_INTERVAL", Duration::from_secs(60)),
            auto_recovery: config::bool_env(prefix, "AUTO_RECOVERY", true),
        }
    }
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            healthy_interval: Duration::from_secs(30),
            unhealthy_interval: Duration::from_secs(5),
            recovery_threshold: 2,
            recovery_interval: Duration::from_secs(60),
            auto_recovery: true,
        }
    }
}

struct Tracked {
    probe: Arc<dyn ComponentProbe>,
    health: ComponentHealth,
    last_recovery_attempt_ms: Option<u64>,
}

/// Composite health monitor over a fixed set of component probes, scheduled
/// with a recursive single timer: each iteration schedules the next one
/// itself instead of running on a fixed-period ticker, so a slow probe
/// never causes iterations to stack up.
pub struct HealthMonitor {
    config: HealthMonitorConfig,
    events: Option<tokio::sync::mpsc::Sender<Event>>,
    components: Mutex<Vec<Tracked>>,
    current_interval_ms: Mutex<u64>,
    consecutive_healthy: Mutex<u32>,
    running: AtomicBool,
    now_ms: Box<dyn Fn() -> u64 + Send + Sync>,
}

impl HealthMonitor {
    pub fn new(config: HealthMonitorConfig, now_ms: impl Fn() -> u64 + Send + Sync + 'static) -> Arc<Self> {
        let healthy_ms = config.healthy_interval.as_millis() as u64;
        Arc::new(Self {
            config,
            events: None,
            components: Mutex::new(Vec::new()),
            current_interval_ms: Mutex::new(healthy_ms),
            consecutive_healthy: Mutex::new(0),
            running: AtomicBool::new(false),
            now_ms: Box::new(now_ms),
        })
    }

    pub fn with_events(mut self: Arc<Self>, tx: tokio::sync::mpsc::Sender<Event>) -> Arc<Self> {
        if let Some(inner) = Arc::get_mut(&mut self) {
            inner.events = Some(tx);
        }
        self
    }

    pub async fn add_probe(&self, probe: Arc<dyn ComponentProbe>) {
        let name = probe.name().to_string();
        self.components.lock().await.push(Tracked {
            probe,
            health: ComponentHealth::unknown(name),
            last_recovery_attempt_ms: None,
        });
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }

    /// Run one probe cycle over every registered component, then return the
    /// interval to wait before the next cycle. Guarded by `running` so a
    /// caller that drives this from a timer never overlaps two cycles.
    pub async fn tick(self: &Arc<Self>) -> Duration {
        if self.running.swap(true, Ordering::SeqCst) {
            let interval_ms = *self.current_interval_ms.lock().await;
            return Duration::from_millis(interval_ms);
        }

        let mut components = self.components.lock().await;
        for tracked in components.iter_mut() {
            let previous = tracked.health.health;
            let observed = tracked.probe.probe().await;
            let now = (self.now_ms)();

            if observed == HealthState::Healthy {
                tracked.health.record_success(now, observed, None);
            } else {
                tracked.health.record_failure(now, observed, format!("{observed:?}"));
            }

            if observed != previous {
                let name = tracked.probe.name().to_string();
                match observed {
                    HealthState::Degraded => self.emit(Event::Degraded { component: name }),
                    HealthState::Unhealthy => self.emit(Event::Degraded { component: name }),
                    HealthState::Healthy if previous != HealthState::Unknown => {
                        self.emit(Event::Recovered { component: name })
                    }
                    _ => {}
                }
            }

            if self.config.auto_recovery && observed == HealthState::Unhealthy {
                self.maybe_recover(tracked).await;
            }
        }

        let worst = aggregate_health(&components.iter().map(|t| t.health.clone()).collect::<Vec<_>>());
        drop(components);

        let interval = self.next_interval(worst).await;
        self.running.store(false, Ordering::SeqCst);
        interval
    }

    async fn maybe_recover(&self, tracked: &mut Tracked) {
        if tracked.health.error_count < self.config.recovery_threshold {
            return;
        }
        let now = (self.now_ms)();
        if let Some(last) = tracked.last_recovery_attempt_ms {
            if now.saturating_sub(last) < self.config.recovery_interval.as_millis() as u64 {
                return;
            }
        }
        tracked.last_recovery_attempt_ms = Some(now);
        let success = tracked.probe.recover().await;
        let name = tracked.probe.name().to_string();
        debug!(component = name, success, "auto-recovery attempted");
        self.emit(Event::RecoveryAttempted { component: name, success });
    }

    /// §4.6: healthy -> grow toward `healthy_interval` with a minimum 1s
    /// step on consecutive healthy runs; degraded -> midpoint; unhealthy ->
    /// `unhealthy_interval` immediately.
    async fn next_interval(&self, worst: HealthState) -> Duration {
        let mut current_ms = self.current_interval_ms.lock().await;
        let healthy_ms = self.config.healthy_interval.as_millis() as u64;
        let unhealthy_ms = self.config.unhealthy_interval.as_millis() as u64;

        let mut consecutive = self.consecutive_healthy.lock().await;
        match worst {
            HealthState::Healthy | HealthState::Unknown => {
                *consecutive += 1;
                let gap = healthy_ms.saturating_sub(*current_ms);
                let step = (gap / 4).max(1_000).min(gap);
                *current_ms = (*current_ms + step).min(healthy_ms);
            }
            HealthState::Degraded => {
                *consecutive = 0;
                *current_ms = (healthy_ms + unhealthy_ms) / 2;
            }
            HealthState::Unhealthy => {
                *consecutive = 0;
                *current_ms = unhealthy_ms;
            }
        }
        Duration::from_millis(*current_ms)
    }

    pub async fn aggregate(&self) -> HealthState {
        let components = self.components.lock().await;
        aggregate_health(&components.iter().map(|t| t.health.clone()).collect::<Vec<_>>())
    }

    pub async fn component_health(&self, name: &str) -> Option<ComponentHealth> {
        let components = self.components.lock().await;
        components.iter().find(|t| t.probe.name() == name).map(|t| t.health.clone())
    }

    /// Drive the recursive single-timer schedule until `stop` is signaled.
    pub async fn run_until(self: Arc<Self>, mut stop: tokio::sync::oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                _ = &mut stop => {
                    info!("health monitor stopping");
                    return;
                }
                interval = self.tick() => {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "health_monitor_tests.rs"]
mod tests;
