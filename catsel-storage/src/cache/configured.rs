//! Cache backend chosen by configuration.

use std::fmt;

use async_trait::async_trait;
use catsel_core::{CatselConfig, CatselResult};

use super::lmdb_backend::LmdbTaggedCache;
use super::memory::InMemoryTaggedCache;
use super::traits::{CacheEntryInfo, CacheStats, TaggedCache};

/// In-memory or LMDB cache, selected by [`CatselConfig::lmdb_path`].
pub enum ConfiguredCache {
    Memory(InMemoryTaggedCache),
    Lmdb(LmdbTaggedCache),
}

impl ConfiguredCache {
    /// Validate `config` and open the backend it names.
    pub fn from_config(config: &CatselConfig) -> CatselResult<Self> {
        config.validate()?;
        match &config.lmdb_path {
            Some(path) => {
                let cache = LmdbTaggedCache::new(path, config.lmdb_max_size_mb)?;
                tracing::info!(
                    path = %path.display(),
                    max_size_mb = config.lmdb_max_size_mb,
                    "Opened LMDB tree cache"
                );
                Ok(Self::Lmdb(cache))
            }
            None => Ok(Self::Memory(InMemoryTaggedCache::new())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Lmdb(_) => "lmdb",
        }
    }

    fn as_dyn(&self) -> &dyn TaggedCache {
        match self {
            Self::Memory(cache) => cache,
            Self::Lmdb(cache) => cache,
        }
    }
}

impl fmt::Debug for ConfiguredCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfiguredCache")
            .field(&self.backend_name())
            .finish()
    }
}

#[async_trait]
impl TaggedCache for ConfiguredCache {
    async fn load(&self, cache_id: &str) -> CatselResult<Option<Vec<u8>>> {
        self.as_dyn().load(cache_id).await
    }

    async fn save(&self, data: &[u8], cache_id: &str, tags: &[&str]) -> CatselResult<()> {
        self.as_dyn().save(data, cache_id, tags).await
    }

    async fn remove(&self, cache_id: &str) -> CatselResult<bool> {
        self.as_dyn().remove(cache_id).await
    }

    async fn clean_tags(&self, tags: &[&str]) -> CatselResult<u64> {
        self.as_dyn().clean_tags(tags).await
    }

    async fn inspect(&self, cache_id: &str) -> CatselResult<Option<CacheEntryInfo>> {
        self.as_dyn().inspect(cache_id).await
    }

    async fn stats(&self) -> CatselResult<CacheStats> {
        self.as_dyn().stats().await
    }
}
