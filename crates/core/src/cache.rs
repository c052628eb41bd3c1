// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project embedding cache.
//!
//! Keyed by the full (untruncated) SHA-256 of the input text, capped at a
//! fixed number of entries, evicting the oldest-inserted entry on overflow.
//! There is no `get`-refreshes-recency behavior here: eviction order is
//! insertion order, not access order, which keeps the structure a plain
//! hash map plus a queue rather than an intrusive linked list.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};

/// Default per-project entry cap (spec.md §4.9).
pub const DEFAULT_CAPACITY: usize = 500;

/// Compute the cache key for a piece of input text. Always the full
/// 32-byte digest, hex-encoded — never truncated, since a truncated key
/// would turn a hash collision into a silent wrong-vector return.
pub fn content_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A single project's embedding cache.
#[derive(Debug)]
pub struct EmbeddingCache {
    capacity: usize,
    entries: HashMap<String, Vec<f32>>,
    insertion_order: VecDeque<String>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a vector by content key, without affecting eviction order.
    pub fn get(&self, key: &str) -> Option<&Vec<f32>> {
        self.entries.get(key)
    }

    /// Insert a vector, evicting the oldest entry if at capacity. A
    /// re-insert of an existing key does not change its position in the
    /// eviction queue.
    pub fn insert(&mut self, key: String, vector: Vec<f32>) {
        if !self.entries.contains_key(&key) {
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.insertion_order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            self.insertion_order.push_back(key.clone());
        }
        self.entries.insert(key, vector);
    }

    /// Split `texts` into cache hits (in input order) and the misses that
    /// must be forwarded to the underlying provider.
    pub fn partition<'a>(&self, texts: &'a [String]) -> (Vec<(usize, Vec<f32>)>, Vec<(usize, &'a str)>) {
        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for (idx, text) in texts.iter().enumerate() {
            let key = content_key(text);
            match self.get(&key) {
                Some(vector) => hits.push((idx, vector.clone())),
                None => misses.push((idx, text.as_str())),
            }
        }
        (hits, misses)
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
