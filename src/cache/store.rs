//! Cache storage.
//!
//! `CacheStore` is the seam between the freshness policy and whatever holds
//! the bytes. Stores are deliberately dumb: they persist opaque payloads
//! under rendered keys, honor a per-entry TTL, and report failures as values.
//! The in-process default is `MemoryStore`; the policy layer never assumes
//! more than this trait.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

/// A cache backend failure.
///
/// These are surfaced to the policy layer and absorbed there; no store error
/// ever reaches a request handler.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache backend unavailable: {message}")]
    Unavailable { message: String },
    #[error("cache payload unusable: {message}")]
    Payload { message: String },
}

impl CacheStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }
}

/// Key-value store with per-entry TTL and best-effort availability.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheStoreError>;

    async fn set(
        &self,
        key: &CacheKey,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheStoreError>;

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheStoreError>;

    async fn clear(&self) -> Result<(), CacheStoreError>;
}

struct StoredEntry {
    payload: Bytes,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-process store: LRU-bounded map of rendered key to TTL-stamped payload.
///
/// Expired entries are dropped on the read that discovers them; anything the
/// reads never touch ages out through LRU eviction instead.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, StoredEntry>>,
}

impl MemoryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    /// Entries currently held, expired or not. Exposed for tests and probes.
    pub fn len(&self) -> usize {
        rw_write(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheStoreError> {
        let now = Instant::now();
        let rendered = key.to_string();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let expired = entries
            .get(&rendered)
            .is_some_and(|entry| entry.is_expired(now));
        if expired {
            entries.pop(&rendered);
            return Ok(None);
        }

        Ok(entries.get(&rendered).map(|entry| entry.payload.clone()))
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        let entry = StoredEntry {
            payload: value,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheStoreError> {
        rw_write(&self.entries, SOURCE, "delete").pop(&key.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheStoreError> {
        rw_write(&self.entries, SOURCE, "clear").clear();
        Ok(())
    }
}
