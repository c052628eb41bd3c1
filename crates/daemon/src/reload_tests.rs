// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_host_adapters::{FakeProcessInspector, FakeSignaler};
use tempfile::tempdir;

fn broadcaster(path: &std::path::Path) -> ReloadBroadcaster<FakeSignaler, FakeProcessInspector> {
    let registry = Arc::new(InstanceRegistry::new(path));
    ReloadBroadcaster::new(registry, FakeSignaler::new(), FakeProcessInspector::new())
}

#[tokio::test]
async fn signals_live_same_project_peers_only() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("instances.jsonl");
    let b = broadcaster(&path);
    b.registry.announce_join(100, "proj-a", 0).expect("join");
    b.registry.announce_join(200, "proj-a", 0).expect("join");
    b.registry.announce_join(300, "proj-b", 0).expect("join");
    b.inspector.set_alive(200, true);
    b.inspector.set_alive(300, true);

    let outcome = b
        .broadcast_reload("proj-a", 100, ReloadReason::Manual, BroadcastOptions::default())
        .await;

    assert_eq!(outcome.signaled, 1);
    assert_eq!(outcome.failed, 0);
    let calls = b.signaler.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].pid, 200);
    assert_eq!(calls[0].signal, Signal::Usr1);
}

#[tokio::test]
async fn dead_peer_is_skipped_not_failed() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("instances.jsonl");
    let b = broadcaster(&path);
    b.registry.announce_join(100, "proj-a", 0).expect("join");
    b.registry.announce_join(200, "proj-a", 0).expect("join");
    b.inspector.set_alive(200, false);

    let outcome = b
        .broadcast_reload("proj-a", 100, ReloadReason::Manual, BroadcastOptions::default())
        .await;

    assert_eq!(outcome.signaled, 0);
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn include_self_allows_self_signal() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("instances.jsonl");
    let b = broadcaster(&path);
    b.registry.announce_join(100, "proj-a", 0).expect("join");
    b.inspector.set_alive(100, true);

    let outcome = b
        .broadcast_reload(
            "proj-a",
            100,
            ReloadReason::Manual,
            BroadcastOptions { include_self: true, include_other_projects: false },
        )
        .await;

    assert_eq!(outcome.signaled, 1);
}

#[tokio::test]
async fn other_projects_excluded_by_default() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("instances.jsonl");
    let b = broadcaster(&path);
    b.registry.announce_join(100, "proj-a", 0).expect("join");
    b.registry.announce_join(300, "proj-b", 0).expect("join");
    b.inspector.set_alive(300, true);

    let outcome = b
        .broadcast_reload("proj-a", 100, ReloadReason::Manual, BroadcastOptions::default())
        .await;

    assert_eq!(outcome.signaled, 0);
    assert_eq!(outcome.skipped, 0);
}
