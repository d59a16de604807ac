//! LMDB-backed tagged cache.
//!
//! Uses the heed crate (Rust bindings for LMDB) to keep cached trees in a
//! memory-mapped store that survives process restarts.
//!
//! # Layout
//!
//! Two named databases live in one environment:
//! - `entries`: `sha256(cache_id)` → `[cached_at: 8 bytes][header len: 4 bytes][header json][payload]`
//! - `tags`: `[tag bytes][0xFF][sha256(cache_id)]` → empty
//!
//! Cache ids embed free-form filter text, so they are hashed to stay under
//! LMDB's key size limit. Tags are UTF-8 and can never contain `0xFF`, which
//! makes `[tag][0xFF]` an exact prefix for one tag's index rows.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. Reads use read transactions; `save`,
//! `remove` and `clean_tags` each run in a single write transaction.

use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use catsel_core::{CacheError, CatselError, CatselResult};
use chrono::{DateTime, Utc};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use super::key::digest_cache_id;
use super::traits::{normalize_tags, CacheEntryInfo, CacheStats, TaggedCache};

/// Separator byte between a tag and an entry digest in the tag index.
const TAG_SEPARATOR: u8 = 0xFF;

/// Fixed bytes before the header: timestamp + header length.
const PREAMBLE_LEN: usize = 12;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open a database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Stored entry could not be decoded.
    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbCacheError to CatselError.
impl From<LmdbCacheError> for CatselError {
    fn from(e: LmdbCacheError) -> Self {
        CatselError::Cache(CacheError::Backend {
            reason: e.to_string(),
        })
    }
}

fn txn_err(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    id: String,
    tags: Vec<String>,
}

/// Decoded view of a stored entry.
struct StoredEntry<'a> {
    cached_at: DateTime<Utc>,
    header: EntryHeader,
    payload: &'a [u8],
}

fn encode_entry(
    cache_id: &str,
    tags: &[String],
    cached_at: DateTime<Utc>,
    payload: &[u8],
) -> Result<Vec<u8>, LmdbCacheError> {
    let header = serde_json::to_vec(&EntryHeader {
        id: cache_id.to_string(),
        tags: tags.to_vec(),
    })
    .map_err(|e| LmdbCacheError::Corrupt(e.to_string()))?;
    let header_len =
        u32::try_from(header.len()).map_err(|_| LmdbCacheError::Corrupt("header too large".into()))?;

    let mut bytes = Vec::with_capacity(PREAMBLE_LEN + header.len() + payload.len());
    bytes.extend_from_slice(&cached_at.timestamp_millis().to_le_bytes());
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

fn decode_entry(bytes: &[u8]) -> Result<StoredEntry<'_>, LmdbCacheError> {
    if bytes.len() < PREAMBLE_LEN {
        return Err(LmdbCacheError::Corrupt("entry shorter than preamble".into()));
    }
    let timestamp_bytes: [u8; 8] = bytes[0..8]
        .try_into()
        .map_err(|_| LmdbCacheError::Corrupt("invalid timestamp".into()))?;
    let length_bytes: [u8; 4] = bytes[8..12]
        .try_into()
        .map_err(|_| LmdbCacheError::Corrupt("invalid header length".into()))?;
    let header_len = u32::from_le_bytes(length_bytes) as usize;
    let header_end = PREAMBLE_LEN
        .checked_add(header_len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| LmdbCacheError::Corrupt("header overruns entry".into()))?;

    let header: EntryHeader = serde_json::from_slice(&bytes[PREAMBLE_LEN..header_end])
        .map_err(|e| LmdbCacheError::Corrupt(e.to_string()))?;
    let cached_at = DateTime::from_timestamp_millis(i64::from_le_bytes(timestamp_bytes))
        .unwrap_or(DateTime::UNIX_EPOCH);

    Ok(StoredEntry {
        cached_at,
        header,
        payload: &bytes[header_end..],
    })
}

fn tag_index_key(tag: &str, digest: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(tag.len() + 1 + digest.len());
    key.extend_from_slice(tag.as_bytes());
    key.push(TAG_SEPARATOR);
    key.extend_from_slice(digest);
    key
}

/// LMDB-backed tagged cache.
///
/// # Example
///
/// ```ignore
/// use catsel_storage::{LmdbTaggedCache, TaggedCache, TREE_CACHE_TAGS};
///
/// let cache = LmdbTaggedCache::new("/var/cache/catsel", 64)?;
/// cache.save(b"[]", "CATALOG_PRODUCT_CATEGORY_TREE_1_", &TREE_CACHE_TAGS).await?;
/// let payload = cache.load("CATALOG_PRODUCT_CATEGORY_TREE_1_").await?;
/// ```
pub struct LmdbTaggedCache {
    /// The LMDB environment.
    env: Env,
    /// Entry payloads keyed by cache id digest.
    entries: Database<Bytes, Bytes>,
    /// Tag index.
    tags: Database<Bytes, Bytes>,
    /// Hit, miss and invalidation counters.
    counters: RwLock<CacheStats>,
}

impl LmdbTaggedCache {
    /// Create a new LMDB tagged cache.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - A database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(2)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let entries: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, Some("entries"))
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        let tags: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, Some("tags"))
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        Ok(Self {
            env,
            entries,
            tags,
            counters: RwLock::new(CacheStats::default()),
        })
    }

    fn bump(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut counters) = self.counters.write() {
            update(&mut counters);
        }
    }

    /// Keys in the tag index starting with `prefix`.
    ///
    /// Walks only the cursor range of the prefix; read errors abort the scan.
    fn collect_tag_keys(&self, txn: &RoTxn, prefix: &[u8]) -> Result<Vec<Vec<u8>>, LmdbCacheError> {
        let mut keys = Vec::new();
        for result in self.tags.prefix_iter(txn, prefix).map_err(txn_err)? {
            let (key, _) = result.map_err(txn_err)?;
            if key.len() > prefix.len() {
                keys.push(key.to_vec());
            }
        }
        Ok(keys)
    }

    /// Delete an entry and its tag rows inside an open write transaction.
    ///
    /// Returns the payload size of the removed entry.
    fn unlink(&self, wtxn: &mut RwTxn, digest: &[u8]) -> Result<Option<usize>, LmdbCacheError> {
        let old_tags = match self.entries.get(&*wtxn, digest).map_err(txn_err)? {
            Some(bytes) => match decode_entry(bytes) {
                Ok(entry) => Some((entry.header.tags, entry.payload.len())),
                Err(e) => {
                    tracing::warn!(error = %e, "Removing undecodable LMDB cache entry");
                    Some((Vec::new(), 0))
                }
            },
            None => None,
        };

        let Some((tags, size)) = old_tags else {
            return Ok(None);
        };
        for tag in &tags {
            self.tags
                .delete(wtxn, &tag_index_key(tag, digest))
                .map_err(txn_err)?;
        }
        self.entries.delete(wtxn, digest).map_err(txn_err)?;
        Ok(Some(size))
    }
}

#[async_trait]
impl TaggedCache for LmdbTaggedCache {
    async fn load(&self, cache_id: &str) -> CatselResult<Option<Vec<u8>>> {
        let digest = digest_cache_id(cache_id);
        let rtxn = self.env.read_txn().map_err(txn_err)?;

        match self.entries.get(&rtxn, &digest) {
            Ok(Some(bytes)) => {
                let entry = decode_entry(bytes)?;
                if entry.header.id != cache_id {
                    // Digest collision: treat as absent.
                    self.bump(|s| s.misses += 1);
                    return Ok(None);
                }
                self.bump(|s| s.hits += 1);
                Ok(Some(entry.payload.to_vec()))
            }
            Ok(None) => {
                self.bump(|s| s.misses += 1);
                Ok(None)
            }
            Err(e) => {
                self.bump(|s| s.misses += 1);
                Err(txn_err(e).into())
            }
        }
    }

    async fn save(&self, data: &[u8], cache_id: &str, tags: &[&str]) -> CatselResult<()> {
        let digest = digest_cache_id(cache_id);
        let tags = normalize_tags(tags);
        let bytes = encode_entry(cache_id, &tags, Utc::now(), data)?;

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.unlink(&mut wtxn, &digest)?;
        self.entries
            .put(&mut wtxn, &digest, &bytes)
            .map_err(txn_err)?;
        for tag in &tags {
            self.tags
                .put(&mut wtxn, &tag_index_key(tag, &digest), &[])
                .map_err(txn_err)?;
        }
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn remove(&self, cache_id: &str) -> CatselResult<bool> {
        let digest = digest_cache_id(cache_id);
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let removed = self.unlink(&mut wtxn, &digest)?.is_some();
        wtxn.commit().map_err(txn_err)?;
        Ok(removed)
    }

    async fn clean_tags(&self, tags: &[&str]) -> CatselResult<u64> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;

        let mut digests: Vec<Vec<u8>> = Vec::new();
        for tag in tags {
            let mut prefix = tag.as_bytes().to_vec();
            prefix.push(TAG_SEPARATOR);
            for key in self.collect_tag_keys(&wtxn, &prefix)? {
                let digest = key[prefix.len()..].to_vec();
                if !digests.contains(&digest) {
                    digests.push(digest);
                }
            }
        }

        let mut removed = 0u64;
        for digest in &digests {
            if self.unlink(&mut wtxn, digest)?.is_some() {
                removed += 1;
            }
        }
        wtxn.commit().map_err(txn_err)?;

        self.bump(|s| s.invalidations += removed);
        Ok(removed)
    }

    async fn inspect(&self, cache_id: &str) -> CatselResult<Option<CacheEntryInfo>> {
        let digest = digest_cache_id(cache_id);
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let Some(bytes) = self.entries.get(&rtxn, &digest).map_err(txn_err)? else {
            return Ok(None);
        };
        let entry = decode_entry(bytes)?;
        if entry.header.id != cache_id {
            return Ok(None);
        }
        Ok(Some(CacheEntryInfo {
            tags: entry.header.tags,
            cached_at: entry.cached_at,
            size_bytes: entry.payload.len(),
        }))
    }

    async fn stats(&self) -> CatselResult<CacheStats> {
        let mut stats = self
            .counters
            .read()
            .map(|s| s.clone())
            .unwrap_or_default();

        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let mut entry_count = 0u64;
        let mut memory_bytes = 0u64;
        for result in self.entries.iter(&rtxn).map_err(txn_err)? {
            let Ok((_, bytes)) = result else { continue };
            entry_count += 1;
            if let Ok(entry) = decode_entry(bytes) {
                memory_bytes += entry.payload.len() as u64;
            }
        }
        stats.entry_count = entry_count;
        stats.memory_bytes = memory_bytes;
        Ok(stats)
    }
}
