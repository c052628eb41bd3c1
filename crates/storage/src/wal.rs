// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL log, generic over the entry type it stores.
//!
//! Used both for the [`crate::instance_registry::InstanceRegistry`]'s peer
//! list and for the optional observability trail files (tool-call and
//! debug logs) — anywhere durable, append-only, line-delimited records are
//! needed. Every write is followed by `sync_all` so a crash after a
//! successful `append` never loses that entry.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An append-only log of `T`, one JSON object per line.
pub struct Wal<T> {
    path: PathBuf,
    file: File,
    sequence: u64,
    _marker: PhantomData<T>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry<T> {
    seq: u64,
    entry: T,
}

impl<T> Wal<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|e| WalError::Io(path.to_path_buf(), e))?;

        let reader = BufReader::new(File::open(path).map_err(|e| WalError::Io(path.to_path_buf(), e))?);
        let sequence = reader.lines().filter(|l| l.as_deref().unwrap_or("").len() > 0).count() as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence,
            _marker: PhantomData,
        })
    }

    pub fn append(&mut self, entry: &T) -> Result<u64, WalError> {
        self.sequence += 1;
        let record = WalEntry { seq: self.sequence, entry };
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{line}").map_err(|e| WalError::Io(self.path.clone(), e))?;
        self.file.sync_all().map_err(|e| WalError::Io(self.path.clone(), e))?;
        Ok(self.sequence)
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay every entry in a log on disk, in append order.
    pub fn replay(path: &Path) -> Result<Vec<T>, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WalError::Io(path.to_path_buf(), e)),
        };

        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| WalError::Io(path.to_path_buf(), e))?;
            if line.is_empty() {
                continue;
            }
            let record: WalEntry<T> = serde_json::from_str(&line)?;
            entries.push(record.entry);
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
