// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn sending_term_to_a_real_child_succeeds() {
    let mut child = std::process::Command::new("sleep")
        .arg("5")
        .spawn()
        .unwrap_or_else(|e| panic!("spawn sleep: {e}"));
    let pid = child.id();

    let signaler = NixSignaler::new();
    let result = signaler.send(pid, Signal::Term).await;
    assert!(result.is_ok());

    let _ = child.wait();
}

#[tokio::test]
async fn sending_to_a_nonexistent_pid_is_reported() {
    let signaler = NixSignaler::new();
    let result = signaler.send(i32::MAX as u32, Signal::Term).await;
    assert!(matches!(result, Err(SignalError::NoSuchProcess(_))));
}
