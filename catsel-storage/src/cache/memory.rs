//! In-process tagged cache.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use catsel_core::{CatselResult, StorageError};
use chrono::{DateTime, Utc};

use super::traits::{normalize_tags, CacheEntryInfo, CacheStats, TaggedCache};

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    tags: Vec<String>,
    cached_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// tag -> ids of entries carrying it
    tag_index: HashMap<String, HashSet<String>>,
    stats: CacheStats,
}

impl Inner {
    fn unlink(&mut self, cache_id: &str) -> Option<Entry> {
        let entry = self.entries.remove(cache_id)?;
        for tag in &entry.tags {
            if let Some(ids) = self.tag_index.get_mut(tag) {
                ids.remove(cache_id);
                if ids.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        self.stats.entry_count = self.stats.entry_count.saturating_sub(1);
        self.stats.memory_bytes = self
            .stats
            .memory_bytes
            .saturating_sub(entry.data.len() as u64);
        Some(entry)
    }
}

/// Tagged cache held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTaggedCache {
    inner: RwLock<Inner>,
}

impl InMemoryTaggedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset statistics.
    pub fn clear(&self) -> CatselResult<()> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        *inner = Inner::default();
        Ok(())
    }
}

#[async_trait]
impl TaggedCache for InMemoryTaggedCache {
    async fn load(&self, cache_id: &str) -> CatselResult<Option<Vec<u8>>> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        let data = inner.entries.get(cache_id).map(|e| e.data.clone());
        if data.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        Ok(data)
    }

    async fn save(&self, data: &[u8], cache_id: &str, tags: &[&str]) -> CatselResult<()> {
        let tags = normalize_tags(tags);
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        inner.unlink(cache_id);

        for tag in &tags {
            inner
                .tag_index
                .entry(tag.clone())
                .or_default()
                .insert(cache_id.to_string());
        }
        inner.stats.entry_count += 1;
        inner.stats.memory_bytes += data.len() as u64;
        inner.entries.insert(
            cache_id.to_string(),
            Entry {
                data: data.to_vec(),
                tags,
                cached_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, cache_id: &str) -> CatselResult<bool> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(inner.unlink(cache_id).is_some())
    }

    async fn clean_tags(&self, tags: &[&str]) -> CatselResult<u64> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        let mut doomed: HashSet<String> = HashSet::new();
        for tag in tags {
            if let Some(ids) = inner.tag_index.get(*tag) {
                doomed.extend(ids.iter().cloned());
            }
        }

        let mut removed = 0u64;
        for cache_id in &doomed {
            if inner.unlink(cache_id).is_some() {
                removed += 1;
            }
        }
        inner.stats.invalidations += removed;
        Ok(removed)
    }

    async fn inspect(&self, cache_id: &str) -> CatselResult<Option<CacheEntryInfo>> {
        let inner = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(inner.entries.get(cache_id).map(|e| CacheEntryInfo {
            tags: e.tags.clone(),
            cached_at: e.cached_at,
            size_bytes: e.data.len(),
        }))
    }

    async fn stats(&self) -> CatselResult<CacheStats> {
        let inner = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(inner.stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_new_cache_is_empty() {
        let cache = InMemoryTaggedCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.load("missing").await.unwrap(), None);
        assert_eq!(cache.stats().await.unwrap().misses, 1);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let cache = InMemoryTaggedCache::new();
        cache.save(b"[]", "tree", &["a"]).await.unwrap();

        assert_eq!(cache.load("tree").await.unwrap(), Some(b"[]".to_vec()));
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.memory_bytes, 2);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_tags() {
        let cache = InMemoryTaggedCache::new();
        cache.save(b"1", "tree", &["old"]).await.unwrap();
        cache.save(b"22", "tree", &["new"]).await.unwrap();

        assert_eq!(cache.clean_tags(&["old"]).await.unwrap(), 0);
        assert_eq!(cache.load("tree").await.unwrap(), Some(b"22".to_vec()));

        let info = cache.inspect("tree").await.unwrap().unwrap();
        assert_eq!(info.tags, vec!["new".to_string()]);
        assert_eq!(info.size_bytes, 2);
        assert_eq!(cache.stats().await.unwrap().entry_count, 1);
    }

    #[tokio::test]
    async fn test_clean_tags_matches_any() {
        let cache = InMemoryTaggedCache::new();
        cache.save(b"1", "a", &["cat", "block"]).await.unwrap();
        cache.save(b"2", "b", &["block"]).await.unwrap();
        cache.save(b"3", "c", &["other"]).await.unwrap();

        assert_eq!(cache.clean_tags(&["cat", "block"]).await.unwrap(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.load("c").await.unwrap().is_some());
        assert_eq!(cache.stats().await.unwrap().invalidations, 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = InMemoryTaggedCache::new();
        cache.save(b"1", "a", &["cat"]).await.unwrap();
        assert!(cache.remove("a").await.unwrap());
        assert!(!cache.remove("a").await.unwrap());
        assert_eq!(cache.clean_tags(&["cat"]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryTaggedCache::new();
        cache.save(b"1", "a", &["cat"]).await.unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().await.unwrap(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_concurrent_saves_last_write_wins() {
        let cache = Arc::new(InMemoryTaggedCache::new());
        let mut handles = vec![];
        for i in 0..10u8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.save(&[i], "same", &["cat"]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.load("same").await.unwrap().map(|d| d.len()), Some(1));
        assert_eq!(cache.clean_tags(&["cat"]).await.unwrap(), 1);
    }
}
