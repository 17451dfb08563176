//! In-process tag registry: tag -> set of dependent cache keys.
//!
//! The registry is an optimization index over the cache, not a source of
//! truth: it may hold keys whose entries have already expired, but a key
//! that was tracked under a tag is always returned by the next drain of
//! that tag. Entries are cleared wholesale when a tag is used for
//! invalidation; the next tracked read repopulates them.

use dashmap::DashMap;
use std::collections::HashSet;

#[derive(Default)]
pub struct TagRegistry {
    tags: DashMap<String, HashSet<String>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            tags: DashMap::new(),
        }
    }

    /// Register `key` as dependent on each of `tags`.
    ///
    /// Concurrent calls for the same tag merge into one set; a track never
    /// overwrites keys registered by another caller.
    pub fn track(&self, tags: &[String], key: &str) {
        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    /// Remove and return every key tracked under `tag`.
    pub fn drain(&self, tag: &str) -> Vec<String> {
        self.tags
            .remove(tag)
            .map(|(_, keys)| keys.into_iter().collect())
            .unwrap_or_default()
    }

    /// Number of keys currently tracked under `tag`.
    pub fn tracked_count(&self, tag: &str) -> usize {
        self.tags.get(tag).map(|keys| keys.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_track_merges_into_one_set() {
        let registry = TagRegistry::new();
        registry.track(&["forum:a".into()], "k1");
        registry.track(&["forum:a".into()], "k2");
        registry.track(&["forum:a".into()], "k2");

        assert_eq!(registry.tracked_count("forum:a"), 2);
    }

    #[test]
    fn test_track_multiple_tags() {
        let registry = TagRegistry::new();
        registry.track(&["forum:a".into(), "moduleType:project".into()], "k1");

        assert_eq!(registry.tracked_count("forum:a"), 1);
        assert_eq!(registry.tracked_count("moduleType:project"), 1);
    }

    #[test]
    fn test_drain_clears_tag() {
        let registry = TagRegistry::new();
        registry.track(&["forum:a".into()], "k1");
        registry.track(&["forum:a".into()], "k2");
        registry.track(&["forum:b".into()], "k3");

        let mut drained = registry.drain("forum:a");
        drained.sort();
        assert_eq!(drained, vec!["k1".to_string(), "k2".to_string()]);
        assert_eq!(registry.tracked_count("forum:a"), 0);
        // Other tags are untouched
        assert_eq!(registry.tracked_count("forum:b"), 1);
    }

    #[test]
    fn test_drain_unknown_tag_is_empty() {
        let registry = TagRegistry::new();
        assert!(registry.drain("forum:missing").is_empty());
    }

    #[test]
    fn test_concurrent_tracks_lose_no_keys() {
        let registry = Arc::new(TagRegistry::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                for j in 0..50 {
                    registry.track(&["forum:a".into()], &format!("k-{}-{}", i, j));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.tracked_count("forum:a"), 8 * 50);
    }
}
