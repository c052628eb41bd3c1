// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn current_process_is_reported_alive() {
    let inspector = SysinfoProcessInspector::new();
    let pid = std::process::id();
    assert!(inspector.is_alive(pid).await);
}

#[tokio::test]
async fn an_implausible_pid_is_not_alive() {
    let inspector = SysinfoProcessInspector::new();
    assert!(!inspector.is_alive(u32::MAX).await);
}

#[tokio::test]
async fn current_process_has_a_nonnegative_age() {
    let inspector = SysinfoProcessInspector::new();
    let pid = std::process::id();
    let age = inspector.process_start_age_hours(pid).await;
    assert!(age.is_some());
    assert!(age.unwrap_or(-1.0) >= 0.0);
}
