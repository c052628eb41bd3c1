// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn severity_orders_unhealthy_above_degraded_above_healthy() {
    assert!(HealthState::Unhealthy.is_worse_than(HealthState::Degraded));
    assert!(HealthState::Degraded.is_worse_than(HealthState::Healthy));
    assert!(!HealthState::Healthy.is_worse_than(HealthState::Degraded));
}

#[test]
fn unknown_is_excluded_from_aggregate() {
    let components = vec![
        ComponentHealth::unknown("db"),
        ComponentHealth {
            health: HealthState::Healthy,
            ..ComponentHealth::unknown("transport")
        },
    ];
    assert_eq!(aggregate(&components), HealthState::Healthy);
}

#[test]
fn aggregate_of_no_reports_is_unknown() {
    let components = vec![ComponentHealth::unknown("db"), ComponentHealth::unknown("transport")];
    assert_eq!(aggregate(&components), HealthState::Unknown);
}

#[test]
fn aggregate_is_the_worst_component() {
    let components = vec![
        ComponentHealth {
            health: HealthState::Healthy,
            ..ComponentHealth::unknown("transport")
        },
        ComponentHealth {
            health: HealthState::Unhealthy,
            ..ComponentHealth::unknown("embedding")
        },
        ComponentHealth {
            health: HealthState::Degraded,
            ..ComponentHealth::unknown("db")
        },
    ];
    assert_eq!(aggregate(&components), HealthState::Unhealthy);
}

#[test]
fn record_success_resets_error_count_and_clears_last_error() {
    let mut c = ComponentHealth::unknown("db");
    c.record_failure(10, HealthState::Unhealthy, "boom");
    assert_eq!(c.error_count, 1);
    c.record_success(20, HealthState::Healthy, None);
    assert_eq!(c.error_count, 0);
    assert!(c.last_error.is_none());
    assert_eq!(c.last_success_at_ms, Some(20));
}

#[test]
fn record_failure_increments_error_count_without_touching_last_success() {
    let mut c = ComponentHealth::unknown("db");
    c.record_success(5, HealthState::Healthy, None);
    c.record_failure(10, HealthState::Degraded, "slow");
    c.record_failure(15, HealthState::Unhealthy, "timeout");
    assert_eq!(c.error_count, 2);
    assert_eq!(c.last_success_at_ms, Some(5));
    assert_eq!(c.last_error.as_deref(), Some("timeout"));
}
