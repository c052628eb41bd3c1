// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project identity and per-project filesystem layout.
//!
//! A [`ProjectIdentity`] derives a stable, filesystem-safe key from a
//! canonical project path and exposes the paths that hang off it: the
//! socket directory, the two sidecar sockets, their PID/lock/stopped-flag
//! files, and the death-reason marker. All of these are pure functions of
//! the key and the sidecar kind — nothing here touches the filesystem except
//! `canonicalize` and the one `create_dir_all` call in [`ProjectIdentity::ensure_socket_dir`].

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

/// Which sidecar a path or operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SidecarKind {
    Embedding,
    CoT,
}

impl SidecarKind {
    /// The file-name stem used for this kind's artifacts (`embedding`, `minicot`).
    pub fn stem(self) -> &'static str {
        match self {
            SidecarKind::Embedding => "embedding",
            SidecarKind::CoT => "minicot",
        }
    }

    /// The socket file name (`embeddings.sock`, `minicot.sock`).
    pub fn socket_name(self) -> &'static str {
        match self {
            SidecarKind::Embedding => "embeddings.sock",
            SidecarKind::CoT => "minicot.sock",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("project path {0} could not be canonicalized: {1}")]
    Canonicalize(PathBuf, #[source] io::Error),
    #[error("failed to create socket directory {0}: {1}")]
    CreateSocketDir(PathBuf, #[source] io::Error),
}

/// Stable identity for a project, and the per-project filesystem layout
/// derived from it. Two `ProjectIdentity::new` calls on the same path
/// always yield the same `project_key()`.
#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    project_key: String,
    root: PathBuf,
}

/// Name of the subdirectory (under the project root) that owns all
/// supervisor state. Kept short and constant rather than configurable,
/// matching spec.md §6.1 ("implementation-defined subdir").
const STATE_SUBDIR: &str = ".oj-host";

impl ProjectIdentity {
    /// Derive an identity from a caller-supplied project path. The path is
    /// canonicalized so that `/a/./b` and `/a/b` collapse to the same key.
    pub fn new(project_path: &Path) -> Result<Self, IdentityError> {
        let root = project_path
            .canonicalize()
            .map_err(|e| IdentityError::Canonicalize(project_path.to_path_buf(), e))?;
        let project_key = derive_project_key(&root);
        Ok(Self { project_key, root })
    }

    /// The stable, filesystem-safe key for this project.
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// The canonical project root this identity was derived from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owning the sidecar sockets and their bookkeeping files.
    pub fn socket_dir(&self) -> PathBuf {
        self.root.join(STATE_SUBDIR).join("sockets")
    }

    /// Create the socket directory if it does not already exist. Atomic in
    /// the sense that `create_dir_all` is idempotent and racing callers
    /// converge on the same directory existing; this is not a substitute
    /// for the start lock.
    pub fn ensure_socket_dir(&self) -> Result<PathBuf, IdentityError> {
        let dir = self.socket_dir();
        std::fs::create_dir_all(&dir)
            .map_err(|e| IdentityError::CreateSocketDir(dir.clone(), e))?;
        Ok(dir)
    }

    pub fn socket_path(&self, kind: SidecarKind) -> PathBuf {
        self.socket_dir().join(kind.socket_name())
    }

    pub fn pid_path(&self, kind: SidecarKind) -> PathBuf {
        self.socket_dir().join(format!("{}.pid", kind.stem()))
    }

    pub fn start_lock_path(&self, kind: SidecarKind) -> PathBuf {
        self.socket_dir().join(format!("{}.starting", kind.stem()))
    }

    pub fn stopped_flag_path(&self, kind: SidecarKind) -> PathBuf {
        self.socket_dir().join(format!("{}.stopped", kind.stem()))
    }

    /// Only the embedding sidecar self-reports a death reason (§3, §4.4.4).
    pub fn death_reason_path(&self) -> PathBuf {
        self.socket_dir().join("embedding-death-reason.txt")
    }

    pub fn tool_calls_log_path(&self) -> PathBuf {
        self.socket_dir().join("mcp-tool-calls.log")
    }

    pub fn debug_log_path(&self) -> PathBuf {
        self.socket_dir().join("mcp-debug.log")
    }

    pub fn model_config_path(&self) -> PathBuf {
        self.root.join(STATE_SUBDIR).join("model-config.json")
    }
}

/// SHA-256 of the canonical path, truncated to 16 hex chars — long enough to
/// be collision-free in practice for a handful of concurrent projects, short
/// enough to stay well under `SUN_LEN` when used as a socket-directory
/// component.
fn derive_project_key(root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    hex_encode(&digest[..8])
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
