// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicU32 as StdAtomicU32, Ordering as StdOrdering};
use std::sync::Mutex as StdMutex;

struct ScriptedProbe {
    name: String,
    states: StdMutex<VecDeque<HealthState>>,
    recover_calls: StdAtomicU32,
}

impl ScriptedProbe {
    fn new(name: &str, states: Vec<HealthState>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            states: StdMutex::new(states.into()),
            recover_calls: StdAtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ComponentProbe for ScriptedProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> HealthState {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        if states.len() > 1 {
            states.pop_front().unwrap_or(HealthState::Unknown)
        } else {
            states.front().copied().unwrap_or(HealthState::Healthy)
        }
    }

    async fn recover(&self) -> bool {
        self.recover_calls.fetch_add(1, StdOrdering::SeqCst);
        true
    }
}

fn clock(now: Arc<AtomicU64>) -> impl Fn() -> u64 + Send + Sync + 'static {
    move || now.load(StdOrdering::SeqCst)
}

#[tokio::test]
async fn healthy_probe_keeps_aggregate_healthy() {
    let now = Arc::new(AtomicU64::new(0));
    let monitor = HealthMonitor::new(HealthMonitorConfig::default(), clock(Arc::clone(&now)));
    monitor.add_probe(ScriptedProbe::new("transport", vec![HealthState::Healthy])).await;

    monitor.tick().await;

    assert_eq!(monitor.aggregate().await, HealthState::Healthy);
}

#[tokio::test]
async fn degraded_probe_emits_event_and_shrinks_interval() {
    let now = Arc::new(AtomicU64::new(0));
    let mut config = HealthMonitorConfig::default();
    config.healthy_interval = Duration::from_secs(30);
    config.unhealthy_interval = Duration::from_secs(5);
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    let monitor = HealthMonitor::new(config, clock(Arc::clone(&now))).with_events(tx);
    monitor.add_probe(ScriptedProbe::new("database", vec![HealthState::Degraded])).await;

    let interval = monitor.tick().await;

    let event = rx.try_recv().expect("degraded event");
    assert_eq!(event.name(), "degraded");
    assert_eq!(interval, Duration::from_millis((30_000 + 5_000) / 2));
}

#[tokio::test]
async fn unhealthy_probe_drops_interval_to_unhealthy_floor() {
    let now = Arc::new(AtomicU64::new(0));
    let mut config = HealthMonitorConfig::default();
    config.unhealthy_interval = Duration::from_secs(5);
    config.auto_recovery = false;
    let monitor = HealthMonitor::new(config, clock(Arc::clone(&now)));
    monitor.add_probe(ScriptedProbe::new("embedding", vec![HealthState::Unhealthy])).await;

    let interval = monitor.tick().await;

    assert_eq!(interval, Duration::from_secs(5));
    assert_eq!(monitor.aggregate().await, HealthState::Unhealthy);
}

#[tokio::test]
async fn recovering_component_emits_recovered_event() {
    let now = Arc::new(AtomicU64::new(0));
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    let monitor = HealthMonitor::new(HealthMonitorConfig::default(), clock(Arc::clone(&now))).with_events(tx);
    monitor
        .add_probe(ScriptedProbe::new("transport", vec![HealthState::Degraded, HealthState::Healthy]))
        .await;

    monitor.tick().await;
    let _ = rx.try_recv();
    monitor.tick().await;

    let event = rx.try_recv().expect("recovered event");
    assert_eq!(event.name(), "recovered");
}

#[tokio::test]
async fn auto_recovery_invokes_probe_recover_past_threshold() {
    let now = Arc::new(AtomicU64::new(0));
    let mut config = HealthMonitorConfig::default();
    config.recovery_threshold = 1;
    config.recovery_interval = Duration::from_secs(0);
    let monitor = HealthMonitor::new(config, clock(Arc::clone(&now)));
    let probe = ScriptedProbe::new("embedding", vec![HealthState::Unhealthy]);
    monitor.add_probe(Arc::clone(&probe) as Arc<dyn ComponentProbe>).await;

    monitor.tick().await;

    assert_eq!(probe.recover_calls.load(StdOrdering::SeqCst), 1);
}

struct ScriptedPool {
    healthy: bool,
    waiters: usize,
    size: usize,
}

#[async_trait]
impl DatabasePool for ScriptedPool {
    async fn trivial_query(&self) -> bool {
        self.healthy
    }

    fn waiter_count(&self) -> usize {
        self.waiters
    }

    fn pool_size(&self) -> usize {
        self.size
    }
}

#[tokio::test]
async fn database_probe_healthy_when_query_succeeds_and_pool_uncontended() {
    let probe = DatabaseProbe::new(Arc::new(ScriptedPool { healthy: true, waiters: 1, size: 10 }));
    assert_eq!(probe.probe().await, HealthState::Healthy);
}

#[tokio::test]
async fn database_probe_degraded_when_waiters_exceed_half_pool_size() {
    let probe = DatabaseProbe::new(Arc::new(ScriptedPool { healthy: true, waiters: 6, size: 10 }));
    assert_eq!(probe.probe().await, HealthState::Degraded);
}

#[tokio::test]
async fn database_probe_unhealthy_when_query_fails() {
    let probe = DatabaseProbe::new(Arc::new(ScriptedPool { healthy: false, waiters: 0, size: 10 }));
    assert_eq!(probe.probe().await, HealthState::Unhealthy);
}

#[tokio::test]
async fn database_probe_unhealthy_when_query_exceeds_timeout() {
    struct HangingPool;
    #[async_trait]
    impl DatabasePool for HangingPool {
        async fn trivial_query(&self) -> bool {
            tokio::time::sleep(Duration::from_secs(60)).await;
            true
        }
        fn waiter_count(&self) -> usize {
            0
        }
        fn pool_size(&self) -> usize {
            10
        }
    }
    let probe = DatabaseProbe::new(Arc::new(HangingPool)).with_timeout(Duration::from_millis(10));
    assert_eq!(probe.probe().await, HealthState::Unhealthy);
}

#[tokio::test]
async fn reentrant_tick_is_ignored_while_running() {
    let now = Arc::new(AtomicU64::new(0));
    let monitor = HealthMonitor::new(HealthMonitorConfig::default(), clock(Arc::clone(&now)));
    monitor.add_probe(ScriptedProbe::new("transport", vec![HealthState::Healthy])).await;
    monitor.running.store(true, Ordering::SeqCst);

    let interval = monitor.tick().await;

    assert_eq!(interval, Duration::from_secs(30));
    monitor.running.store(false, Ordering::SeqCst);
}
