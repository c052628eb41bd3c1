// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn recipe(program: &str, args: &[&str]) -> LaunchRecipe {
    LaunchRecipe {
        program: program.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        cwd: None,
        env: vec![],
    }
}

#[tokio::test]
async fn spawns_and_waits_for_exit_code() {
    let spawner = TokioSpawner::new();
    let mut child = spawner
        .spawn(&recipe("true", &[]))
        .await
        .unwrap_or_else(|e| panic!("spawn: {e}"));
    assert!(child.pid() > 0);
    let code = child.wait().await.unwrap_or_else(|e| panic!("wait: {e}"));
    assert_eq!(code, Some(0));
}

#[tokio::test]
async fn try_wait_reports_none_before_exit_and_some_after() {
    let spawner = TokioSpawner::new();
    let mut child = spawner
        .spawn(&recipe("sleep", &["0.2"]))
        .await
        .unwrap_or_else(|e| panic!("spawn: {e}"));
    assert_eq!(
        child.try_wait().await.unwrap_or_else(|e| panic!("try_wait: {e}")),
        None
    );
    child.wait().await.unwrap_or_else(|e| panic!("wait: {e}"));
}

#[tokio::test]
async fn spawn_of_missing_binary_errors() {
    let spawner = TokioSpawner::new();
    let result = spawner.spawn(&recipe("definitely-not-a-real-binary-xyz", &[])).await;
    assert!(result.is_err());
}
