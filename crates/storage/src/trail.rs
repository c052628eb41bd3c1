// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional observability trail files: `mcp-tool-calls.log` and
//! `mcp-debug.log`. Unlike [`crate::wal::Wal`], these are not replayed —
//! they exist purely for a human or a log shipper to tail, so each line is
//! a self-contained JSON object with its own timestamp rather than a
//! sequence-numbered record.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("I/O error writing trail {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
}

/// Append-only, best-effort-durable line writer.
pub struct TrailWriter {
    path: PathBuf,
}

impl TrailWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one line, serialized as `{"ts": <unix-ms>, ...fields}`. A
    /// write failure here is never allowed to take down the caller — the
    /// trail is observability, not correctness state — so callers
    /// typically log the error and continue rather than propagate it.
    pub fn record(&self, now_ms: u64, fields: serde_json::Value) -> Result<(), TrailError> {
        let mut record = serde_json::json!({ "ts": now_ms });
        if let (Some(record_obj), Some(fields_obj)) = (record.as_object_mut(), fields.as_object()) {
            for (key, value) in fields_obj {
                record_obj.insert(key.clone(), value.clone());
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TrailError::Io(self.path.clone(), e))?;
        writeln!(file, "{record}").map_err(|e| TrailError::Io(self.path.clone(), e))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "trail_tests.rs"]
mod tests;
