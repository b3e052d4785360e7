//! Key/value stores for serialized responses

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::error::CacheResult;

/// A string key/value store with per-entry expiration.
///
/// Implement this to back the response cache with an external service.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The value under `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key` for `expiration`
    async fn set(&self, key: &str, value: String, expiration: Duration) -> CacheResult<()>;

    /// Remove `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> CacheResult<()>;
}

/// A stored value with expiration tracking
#[derive(Debug, Clone)]
struct StoreEntry {
    value: String,
    created_at: Instant,
    ttl: Duration,
}

impl StoreEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// In-process LRU store.
///
/// The least recently used entry is evicted once `max_entries` is reached.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<LruCache<String, StoreEntry>>>,
}

impl MemoryStore {
    /// Create a store holding at most `max_entries` values
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop expired entries, returning how many were removed
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        tracing::debug!(count = expired.len(), "expired entries removed");
        expired.len()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_expired() {
                tracing::debug!("store entry expired");
                entries.pop(key);
                return Ok(None);
            }
            tracing::trace!("store hit");
            return Ok(Some(entry.value.clone()));
        }
        tracing::trace!("store miss");
        Ok(None)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: String, expiration: Duration) -> CacheResult<()> {
        let entry = StoreEntry::new(value, expiration);
        let mut entries = self.entries.write().await;
        let will_evict = entries.len() >= entries.cap().get() && !entries.contains(key);
        entries.put(key.to_string(), entry);
        if will_evict {
            tracing::debug!("LRU eviction occurred");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.pop(key);
        Ok(())
    }
}
