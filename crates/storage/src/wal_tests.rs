// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestRecord {
    name: String,
    value: u32,
}

#[test]
fn append_then_replay_round_trips_in_order() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let path = dir.path().join("test.wal");

    {
        let mut wal: Wal<TestRecord> = Wal::open(&path).unwrap_or_else(|e| panic!("open: {e}"));
        wal.append(&TestRecord { name: "a".into(), value: 1 })
            .unwrap_or_else(|e| panic!("append: {e}"));
        wal.append(&TestRecord { name: "b".into(), value: 2 })
            .unwrap_or_else(|e| panic!("append: {e}"));
    }

    let records: Vec<TestRecord> = Wal::replay(&path).unwrap_or_else(|e| panic!("replay: {e}"));
    assert_eq!(records, vec![
        TestRecord { name: "a".into(), value: 1 },
        TestRecord { name: "b".into(), value: 2 },
    ]);
}

#[test]
fn sequence_continues_across_reopen() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let path = dir.path().join("test.wal");

    {
        let mut wal: Wal<TestRecord> = Wal::open(&path).unwrap_or_else(|e| panic!("open: {e}"));
        wal.append(&TestRecord { name: "a".into(), value: 1 })
            .unwrap_or_else(|e| panic!("append: {e}"));
        assert_eq!(wal.sequence(), 1);
    }

    let mut wal: Wal<TestRecord> = Wal::open(&path).unwrap_or_else(|e| panic!("reopen: {e}"));
    assert_eq!(wal.sequence(), 1);
    wal.append(&TestRecord { name: "b".into(), value: 2 })
        .unwrap_or_else(|e| panic!("append: {e}"));
    assert_eq!(wal.sequence(), 2);
}

#[test]
fn replay_of_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let path = dir.path().join("never-written.wal");
    let records: Vec<TestRecord> = Wal::replay(&path).unwrap_or_else(|e| panic!("replay: {e}"));
    assert!(records.is_empty());
}
