// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::process_inspector::FakeProcessInspector;

const ENV_VAR: &str = "OJ_EMBEDDING_SOCKET";

#[tokio::test]
async fn dead_process_has_unknown_ownership() {
    let inspector = FakeProcessInspector::new();
    let ownership = inspector.classify_ownership(1, ENV_VAR, "/a/embeddings.sock").await;
    assert_eq!(ownership, Ownership::Unknown);
}

#[tokio::test]
async fn matching_bound_socket_env_is_owned_by_this_project() {
    let inspector = FakeProcessInspector::new();
    inspector.set_alive(1, true);
    inspector.set_env(1, ENV_VAR, "/a/embeddings.sock");
    let ownership = inspector.classify_ownership(1, ENV_VAR, "/a/embeddings.sock").await;
    assert_eq!(ownership, Ownership::OwnedByThisProject);
}

#[tokio::test]
async fn mismatched_bound_socket_env_is_owned_by_other_project() {
    let inspector = FakeProcessInspector::new();
    inspector.set_alive(1, true);
    inspector.set_env(1, ENV_VAR, "/b/embeddings.sock");
    let ownership = inspector.classify_ownership(1, ENV_VAR, "/a/embeddings.sock").await;
    assert_eq!(ownership, Ownership::OwnedByOtherProject);
}

#[tokio::test]
async fn falls_back_to_command_line_when_env_unreadable() {
    let inspector = FakeProcessInspector::new();
    inspector.set_alive(1, true);
    inspector.set_command_line(1, "embedding-server --socket /a/embeddings.sock");
    let ownership = inspector.classify_ownership(1, ENV_VAR, "/a/embeddings.sock").await;
    assert_eq!(ownership, Ownership::OwnedByThisProject);
}

#[tokio::test]
async fn unreadable_env_and_nonmatching_cmdline_is_unknown_never_other() {
    let inspector = FakeProcessInspector::new();
    inspector.set_alive(1, true);
    inspector.set_command_line(1, "some-unrelated-process");
    let ownership = inspector.classify_ownership(1, ENV_VAR, "/a/embeddings.sock").await;
    assert_eq!(ownership, Ownership::Unknown);
}
