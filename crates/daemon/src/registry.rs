// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PerProjectRegistry`: a keyed map of lazily-created per-project values
//! with a background sweeper that tears down entries idle past a TTL.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use oj_host_core::Clock;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Implemented by anything the registry can hold: torn down when the
/// sweeper evicts it, or on an explicit `remove`.
pub trait Teardown: Send + Sync + 'static {
    fn shutdown(self: Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

struct Entry<T> {
    value: Arc<T>,
    last_access_ms: u64,
}

/// Generic `projectKey -> T` map with idle eviction. One registry exists
/// per value type the daemon manages lazily (supervisor pairs, monitors,
/// caches).
pub struct PerProjectRegistry<T: Teardown, C: Clock> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    clock: C,
    idle_ttl: Duration,
}

impl<T: Teardown, C: Clock> PerProjectRegistry<T, C> {
    pub fn new(clock: C, idle_ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            idle_ttl,
        })
    }

    /// Fetch the value for `project_key`, creating it lazily via `create`
    /// if absent, and refreshing its last-access timestamp either way.
    pub async fn get_or_create<F, Fut>(&self, project_key: &str, create: F) -> Arc<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Arc<T>>,
    {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now_ms();
        if let Some(entry) = entries.get_mut(project_key) {
            entry.last_access_ms = now;
            return Arc::clone(&entry.value);
        }
        drop(entries);

        let value = create().await;
        let mut entries = self.entries.lock().await;
        entries
            .entry(project_key.to_string())
            .or_insert_with(|| Entry { value: Arc::clone(&value), last_access_ms: now });
        value
    }

    pub async fn get(&self, project_key: &str) -> Option<Arc<T>> {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now_ms();
        entries.get_mut(project_key).map(|entry| {
            entry.last_access_ms = now;
            Arc::clone(&entry.value)
        })
    }

    /// Explicitly tear down and remove one entry, regardless of idle time.
    pub async fn remove(&self, project_key: &str) {
        let removed = self.entries.lock().await.remove(project_key);
        if let Some(entry) = removed {
            entry.value.shutdown().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Evict every entry idle longer than `idle_ttl`, tearing each down.
    /// Call this from a periodic sweeper; it never blocks process exit on
    /// its own (no internal timer owns this — see `run_sweeper`).
    async fn sweep_once(&self) {
        let now = self.clock.now_ms();
        let ttl_ms = self.idle_ttl.as_millis() as u64;

        let stale: Vec<(String, Arc<T>)> = {
            let entries = self.entries.lock().await;
            entries
                .iter()
                .filter(|(_, entry)| now.saturating_sub(entry.last_access_ms) > ttl_ms)
                .map(|(key, entry)| (key.clone(), Arc::clone(&entry.value)))
                .collect()
        };

        if stale.is_empty() {
            return;
        }

        let mut entries = self.entries.lock().await;
        for (key, _) in &stale {
            entries.remove(key);
        }
        drop(entries);

        for (key, value) in stale {
            debug!(project_key = key, "evicting idle project registration");
            value.shutdown().await;
        }
    }

    /// Drive the 5-minute sweep loop until `stop` fires. Spawned as a
    /// detached task via `tokio::spawn`, which is always abortable and
    /// never blocks the runtime from shutting down on its own.
    pub async fn run_sweeper(self: Arc<Self>, interval: Duration, mut stop: tokio::sync::oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                _ = &mut stop => {
                    info!("project registry sweeper stopping");
                    return;
                }
                _ = tokio::time::sleep(interval) => {
                    self.sweep_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
