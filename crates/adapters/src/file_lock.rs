// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process exclusive-create file lock.
//!
//! Contention is resolved by the OS's exclusive-create semantics, never by
//! a check-then-create sequence: [`try_acquire`] only reports success after
//! `OpenOptions::create_new` itself succeeds. A held lock embeds its
//! owner's timestamp and PID so a crashed holder's lock can be detected as
//! stale and forcibly released by a later caller.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileLockError {
    #[error("lock at {0} is held by another process")]
    Held(std::path::PathBuf),
    #[error("I/O error operating on lock {0}: {1}")]
    Io(std::path::PathBuf, #[source] io::Error),
}

/// The parsed contents of a held lock file: `"<unix-ms>:<pid>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockHolder {
    pub acquired_at_ms: u64,
    pub pid: u32,
}

fn format_holder(now_ms: u64, pid: u32) -> String {
    format!("{now_ms}:{pid}")
}

fn parse_holder(contents: &str) -> Option<LockHolder> {
    let (ms, pid) = contents.trim().split_once(':')?;
    Some(LockHolder {
        acquired_at_ms: ms.parse().ok()?,
        pid: pid.parse().ok()?,
    })
}

/// Attempt to acquire the lock at `path`. If a lock file already exists and
/// is older than `ttl`, it is treated as stale: removed, then creation is
/// retried once. Returns `FileLockError::Held` if a live (non-stale) lock
/// is held by someone else.
pub fn try_acquire(path: &Path, ttl: Duration, now_ms: u64, self_pid: u32) -> Result<(), FileLockError> {
    match create_exclusive(path, now_ms, self_pid) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(FileLockError::Io(path.to_path_buf(), e)),
    }

    let holder = read_holder(path)?;
    let is_stale = match holder {
        Some(h) => now_ms.saturating_sub(h.acquired_at_ms) >= ttl.as_millis() as u64,
        None => true,
    };
    if !is_stale {
        return Err(FileLockError::Held(path.to_path_buf()));
    }

    let _ = std::fs::remove_file(path);

    create_exclusive(path, now_ms, self_pid).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            FileLockError::Held(path.to_path_buf())
        } else {
            FileLockError::Io(path.to_path_buf(), e)
        }
    })
}

fn create_exclusive(path: &Path, now_ms: u64, self_pid: u32) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(format_holder(now_ms, self_pid).as_bytes())?;
    Ok(())
}

/// Read and parse the current holder of `path`, if the file exists and is
/// well-formed.
pub fn read_holder(path: &Path) -> Result<Option<LockHolder>, FileLockError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(parse_holder(&contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FileLockError::Io(path.to_path_buf(), e)),
    }
}

/// Release the lock by deleting the file. Idempotent: releasing an
/// already-absent lock is not an error.
pub fn release(path: &Path) -> Result<(), FileLockError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FileLockError::Io(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
#[path = "file_lock_tests.rs"]
mod tests;
