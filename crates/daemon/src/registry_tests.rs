// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_host_core::FakeClock;
use std::sync::atomic::{AtomicU32, Ordering};

struct CountingValue {
    shutdowns: Arc<AtomicU32>,
}

impl Teardown for CountingValue {
    fn shutdown(self: Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let shutdowns = Arc::clone(&self.shutdowns);
        Box::pin(async move {
            shutdowns.fetch_add(1, Ordering::SeqCst);
        })
    }
}

#[tokio::test]
async fn get_or_create_reuses_existing_entry() {
    let clock = FakeClock::new();
    let registry: Arc<PerProjectRegistry<CountingValue, FakeClock>> =
        PerProjectRegistry::new(clock, Duration::from_secs(1800));
    let shutdowns = Arc::new(AtomicU32::new(0));

    let a = registry
        .get_or_create("proj-a", || async { Arc::new(CountingValue { shutdowns: Arc::clone(&shutdowns) }) })
        .await;
    let b = registry
        .get_or_create("proj-a", || async { Arc::new(CountingValue { shutdowns: Arc::clone(&shutdowns) }) })
        .await;

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn sweep_evicts_idle_entries_and_tears_down() {
    let clock = FakeClock::new();
    let registry: Arc<PerProjectRegistry<CountingValue, FakeClock>> =
        PerProjectRegistry::new(clock.clone(), Duration::from_secs(1800));
    let shutdowns = Arc::new(AtomicU32::new(0));

    registry
        .get_or_create("proj-a", || async { Arc::new(CountingValue { shutdowns: Arc::clone(&shutdowns) }) })
        .await;

    clock.advance(Duration::from_secs(1801));
    registry.sweep_once().await;

    assert_eq!(registry.len().await, 0);
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sweep_leaves_recently_accessed_entries() {
    let clock = FakeClock::new();
    let registry: Arc<PerProjectRegistry<CountingValue, FakeClock>> =
        PerProjectRegistry::new(clock.clone(), Duration::from_secs(1800));
    let shutdowns = Arc::new(AtomicU32::new(0));

    registry
        .get_or_create("proj-a", || async { Arc::new(CountingValue { shutdowns: Arc::clone(&shutdowns) }) })
        .await;

    clock.advance(Duration::from_secs(900));
    registry.get("proj-a").await;
    clock.advance(Duration::from_secs(900));
    registry.sweep_once().await;

    assert_eq!(registry.len().await, 1);
    assert_eq!(shutdowns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn remove_tears_down_regardless_of_idle_time() {
    let clock = FakeClock::new();
    let registry: Arc<PerProjectRegistry<CountingValue, FakeClock>> =
        PerProjectRegistry::new(clock, Duration::from_secs(1800));
    let shutdowns = Arc::new(AtomicU32::new(0));

    registry
        .get_or_create("proj-a", || async { Arc::new(CountingValue { shutdowns: Arc::clone(&shutdowns) }) })
        .await;
    registry.remove("proj-a").await;

    assert_eq!(registry.len().await, 0);
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}
