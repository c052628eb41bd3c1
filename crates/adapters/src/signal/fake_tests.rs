// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn records_sent_signals() {
    let signaler = FakeSignaler::new();
    signaler.send(10, Signal::Term).await.unwrap_or_else(|e| panic!("{e}"));
    signaler.send(10, Signal::Kill).await.unwrap_or_else(|e| panic!("{e}"));
    let calls = signaler.calls();
    assert_eq!(calls, vec![
        SignalCall { pid: 10, signal: Signal::Term },
        SignalCall { pid: 10, signal: Signal::Kill },
    ]);
}

#[tokio::test]
async fn marked_dead_pids_report_no_such_process() {
    let signaler = FakeSignaler::new();
    signaler.mark_dead(7);
    let result = signaler.send(7, Signal::Term).await;
    assert!(matches!(result, Err(SignalError::NoSuchProcess(7))));
}
