// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-variable configuration helpers.
//!
//! Every knob in this system has a documented default and is overridable by
//! an env var under a caller-chosen prefix. Parsing never fails the
//! process: an unset or unparseable value silently falls back to the
//! default, per spec.md §6.5 ("All integer/float parsing must fall back to
//! the documented default on parse failure (never crash)").

use std::time::Duration;

/// Read `<prefix>_<suffix>` as a millisecond duration, defaulting on
/// missing or unparseable input.
pub fn duration_ms_env(prefix: &str, suffix: &str, default: Duration) -> Duration {
    read_env(prefix, suffix)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Read `<prefix>_<suffix>` as a whole-second duration, defaulting on
/// missing or unparseable input.
pub fn duration_secs_env(prefix: &str, suffix: &str, default: Duration) -> Duration {
    read_env(prefix, suffix)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Read `<prefix>_<suffix>` as a `usize`, defaulting on missing or
/// unparseable input.
pub fn usize_env(prefix: &str, suffix: &str, default: usize) -> usize {
    read_env(prefix, suffix)
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

/// Read `<prefix>_<suffix>` as a boolean. Accepts `1`/`0`, and
/// case-insensitive `true`/`false`/`yes`/`no`; anything else falls back to
/// the default.
pub fn bool_env(prefix: &str, suffix: &str, default: bool) -> bool {
    match read_env(prefix, suffix) {
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => default,
        },
        None => default,
    }
}

/// Read `<prefix>_<suffix>` as a raw string, if set and non-empty.
pub fn string_env(prefix: &str, suffix: &str) -> Option<String> {
    read_env(prefix, suffix)
}

fn read_env(prefix: &str, suffix: &str) -> Option<String> {
    let key = format!("{prefix}_{suffix}");
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
