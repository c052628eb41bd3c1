// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn distinct_inputs_get_distinct_keys() {
    assert_ne!(content_key("hello"), content_key("world"));
}

#[test]
fn same_input_gets_same_key() {
    assert_eq!(content_key("hello"), content_key("hello"));
}

#[test]
fn content_key_is_full_sha256_hex() {
    assert_eq!(content_key("hello").len(), 64);
}

#[test]
fn insert_then_get_returns_the_same_vector() {
    let mut cache = EmbeddingCache::new(10);
    let key = content_key("hello");
    cache.insert(key.clone(), vec![1.0, 2.0, 3.0]);
    assert_eq!(cache.get(&key), Some(&vec![1.0, 2.0, 3.0]));
}

#[test]
fn miss_returns_none() {
    let cache = EmbeddingCache::new(10);
    assert_eq!(cache.get(&content_key("nope")), None);
}

#[test]
fn eviction_at_capacity_drops_the_oldest_inserted() {
    let mut cache = EmbeddingCache::new(2);
    cache.insert("a".into(), vec![1.0]);
    cache.insert("b".into(), vec![2.0]);
    cache.insert("c".into(), vec![3.0]);
    assert_eq!(cache.len(), 2);
    assert!(cache.get("a").is_none());
    assert!(cache.get("b").is_some());
    assert!(cache.get("c").is_some());
}

#[test]
fn reinserting_an_existing_key_does_not_evict() {
    let mut cache = EmbeddingCache::new(2);
    cache.insert("a".into(), vec![1.0]);
    cache.insert("b".into(), vec![2.0]);
    cache.insert("a".into(), vec![9.0]);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), Some(&vec![9.0]));
    assert!(cache.get("b").is_some());
}

#[test]
fn partition_splits_hits_and_misses_preserving_index() {
    let mut cache = EmbeddingCache::new(10);
    cache.insert(content_key("known"), vec![1.0]);
    let texts = vec!["known".to_string(), "unknown".to_string()];
    let (hits, misses) = cache.partition(&texts);
    assert_eq!(hits, vec![(0, vec![1.0])]);
    assert_eq!(misses, vec![(1, "unknown")]);
}

#[test]
fn default_capacity_matches_spec_cap() {
    assert_eq!(DEFAULT_CAPACITY, 500);
}

proptest! {
    #[test]
    fn cache_never_holds_more_entries_than_its_capacity(
        capacity in 1usize..16,
        texts in proptest::collection::vec("[a-z]{1,8}", 0..64),
    ) {
        let mut cache = EmbeddingCache::new(capacity);
        for text in &texts {
            cache.insert(content_key(text), vec![1.0]);
        }
        prop_assert!(cache.len() <= capacity);
    }

    #[test]
    fn distinct_strings_never_collide_on_content_key(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        prop_assume!(a != b);
        prop_assert_ne!(content_key(&a), content_key(&b));
    }
}
