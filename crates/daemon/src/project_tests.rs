// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use oj_host_core::{FakeClock, HealthState};
use tempfile::tempdir;

struct FakePool {
    healthy: bool,
    waiters: usize,
    size: usize,
}

#[async_trait]
impl DatabasePool for FakePool {
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
async fn new_registers_a_probe_per_component() {
    let dir = tempdir().expect("tempdir");
    let identity = ProjectIdentity::new(dir.path()).expect("identity");
    let (tx, _rx) = tokio::sync::mpsc::channel(16);
    let host = ProjectHost::new(identity, FakeClock::new(), tx, None).await;

    assert!(host.health.component_health("embedding").await.is_some());
    assert!(host.health.component_health("cot").await.is_some());
    assert!(host.health.component_health("transport").await.is_some());
    assert_eq!(host.aggregate_health().await, HealthState::Unknown);
}

#[tokio::test]
async fn shutdown_is_safe_before_start() {
    let dir = tempdir().expect("tempdir");
    let identity = ProjectIdentity::new(dir.path()).expect("identity");
    let (tx, _rx) = tokio::sync::mpsc::channel(16);
    let host = ProjectHost::new(identity, FakeClock::new(), tx, None).await;

    host.shutdown().await;
}

#[tokio::test]
async fn database_probe_reports_unhealthy_on_failed_query() {
    let dir = tempdir().expect("tempdir");
    let identity = ProjectIdentity::new(dir.path()).expect("identity");
    let (tx, _rx) = tokio::sync::mpsc::channel(16);
    let pool: Arc<dyn DatabasePool> = Arc::new(FakePool { healthy: false, waiters: 0, size: 10 });
    let host = ProjectHost::new(identity, FakeClock::new(), tx, Some(pool)).await;

    assert!(host.health.component_health("database").await.is_some());
    host.health.tick().await;
    let health = host.health.component_health("database").await.expect("probe");
    assert_eq!(health.health, HealthState::Unhealthy);
}

#[tokio::test]
async fn database_probe_reports_degraded_on_high_waiter_ratio() {
    let dir = tempdir().expect("tempdir");
    let identity = ProjectIdentity::new(dir.path()).expect("identity");
    let (tx, _rx) = tokio::sync::mpsc::channel(16);
    let pool: Arc<dyn DatabasePool> = Arc::new(FakePool { healthy: true, waiters: 6, size: 10 });
    let host = ProjectHost::new(identity, FakeClock::new(), tx, Some(pool)).await;

    host.health.tick().await;
    let health = host.health.component_health("database").await.expect("probe");
    assert_eq!(health.health, HealthState::Degraded);
}
